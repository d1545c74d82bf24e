// History sink: raw RSI samples and executed trade records
pub mod json_file;
pub mod redis_store;

use crate::config::{HistoryBackend, HistorySettings};
use crate::models::{IndicatorSample, TradeRecord};
use crate::Result;
use async_trait::async_trait;

pub use self::json_file::JsonFileStore;
pub use self::redis_store::RedisHistoryStore;

pub const SAMPLES_COLLECTION: &str = "rawIndicatorSamples";
pub const TRADES_COLLECTION: &str = "tradeRecords";

/// Append-only history. Records are never updated or deleted.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_sample(&self, sample: &IndicatorSample) -> Result<()>;
    async fn append_trade(&self, record: &TradeRecord) -> Result<()>;
}

/// Open the backend selected in config
pub async fn open(settings: &HistorySettings) -> Result<Box<dyn HistoryStore>> {
    match settings.backend {
        HistoryBackend::Json => {
            let store = JsonFileStore::open(&settings.path).await?;
            tracing::info!(
                "History: JSON document at {} ({} samples, {} trades)",
                store.path().display(),
                store.samples().await.len(),
                store.trades().await.len()
            );
            Ok(Box::new(store))
        }
        HistoryBackend::Redis => {
            let store =
                RedisHistoryStore::new(&settings.redis_url, settings.key_prefix.as_deref()).await?;
            Ok(Box::new(store))
        }
    }
}
