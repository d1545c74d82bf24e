use super::HistoryStore;
use crate::models::{IndicatorSample, TradeRecord};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk layout: one document holding both collections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryDocument {
    #[serde(default)]
    raw_indicator_samples: Vec<IndicatorSample>,
    #[serde(default)]
    trade_records: Vec<TradeRecord>,
}

/// JSON file history store
///
/// Keeps the document in memory and rewrites the file on every append.
/// Writes go to a sibling temp file first and are renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<HistoryDocument>,
}

impl JsonFileStore {
    /// Open `path`, creating it with empty collections if it does not exist
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let document = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes)?,
            Ok(_) => HistoryDocument::default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HistoryDocument::default(),
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path,
            document: Mutex::new(document),
        };
        {
            let doc = store.document.lock().await;
            store.write(&doc).await?;
        }
        Ok(store)
    }

    async fn write(&self, document: &HistoryDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn samples(&self) -> Vec<IndicatorSample> {
        self.document.lock().await.raw_indicator_samples.clone()
    }

    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.document.lock().await.trade_records.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonFileStore {
    async fn append_sample(&self, sample: &IndicatorSample) -> Result<()> {
        let mut doc = self.document.lock().await;
        doc.raw_indicator_samples.push(sample.clone());
        self.write(&doc).await?;
        tracing::debug!(id = sample.id, value = sample.value, "Saved RSI sample");
        Ok(())
    }

    async fn append_trade(&self, record: &TradeRecord) -> Result<()> {
        let mut doc = self.document.lock().await;
        doc.trade_records.push(record.clone());
        self.write(&doc).await?;
        tracing::debug!(id = record.id, action = %record.action, "Saved trade record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeAction;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_open_creates_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(store.samples().await.is_empty());

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["rawIndicatorSamples"], serde_json::json!([]));
        assert_eq!(raw["tradeRecords"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_appends_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.append_sample(&IndicatorSample { id: 1, value: 72.0 }).await.unwrap();
            store.append_sample(&IndicatorSample { id: 2, value: 68.0 }).await.unwrap();
            store
                .append_trade(&TradeRecord {
                    id: 2,
                    value: 68.0,
                    price: Decimal::new(2_500_000, 0),
                    quantity: 1,
                    action: TradeAction::Sell,
                })
                .await
                .unwrap();
        }

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let samples = reopened.samples().await;
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, 72.0);
        assert_eq!(samples[1].id, 2);

        let trades = reopened.trades().await;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].action, TradeAction::Sell);
        assert_eq!(trades[0].price, Decimal::new(2_500_000, 0));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(JsonFileStore::open(&path).await.is_err());
    }
}
