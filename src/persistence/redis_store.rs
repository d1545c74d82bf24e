use super::{HistoryStore, SAMPLES_COLLECTION, TRADES_COLLECTION};
use crate::models::{IndicatorSample, TradeRecord};
use crate::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::time::{timeout, Duration};

/// Redis history store
///
/// Each collection is a sorted set scored by the record id (epoch millis),
/// which keeps insertion order and allows time-range reads.
pub struct RedisHistoryStore {
    conn: ConnectionManager,
    samples_key: String,
    trades_key: String,
}

impl RedisHistoryStore {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `key_prefix` - Optional namespace, keys become `{prefix}:rawIndicatorSamples`
    pub async fn new(redis_url: &str, key_prefix: Option<&str>) -> Result<Self> {
        let client = Client::open(redis_url)?;

        let conn = timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "Redis connection timeout after 5 seconds",
                )
            })??;

        tracing::info!("Connected to Redis at {}", redis_url);

        let key = |collection: &str| match key_prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, collection),
            _ => collection.to_string(),
        };

        Ok(Self {
            conn,
            samples_key: key(SAMPLES_COLLECTION),
            trades_key: key(TRADES_COLLECTION),
        })
    }

    async fn append(&self, key: &str, member: String, score: i64) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(key, member, score as f64).await?;
        Ok(())
    }

    pub async fn count_samples(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.zcard(&self.samples_key).await?)
    }

    pub async fn count_trades(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.zcard(&self.trades_key).await?)
    }

    /// Trade records with `id >= since_millis`, oldest first
    pub async fn trades_since(&self, since_millis: i64) -> Result<Vec<TradeRecord>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn
            .zrangebyscore(&self.trades_key, since_millis as f64, "+inf")
            .await?;

        raw.iter()
            .map(|json| serde_json::from_str(json).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn append_sample(&self, sample: &IndicatorSample) -> Result<()> {
        let member = serde_json::to_string(sample)?;
        self.append(&self.samples_key, member, sample.id).await?;
        tracing::debug!(id = sample.id, value = sample.value, "Saved RSI sample to Redis");
        Ok(())
    }

    async fn append_trade(&self, record: &TradeRecord) -> Result<()> {
        let member = serde_json::to_string(record)?;
        self.append(&self.trades_key, member, record.id).await?;
        tracing::debug!(id = record.id, action = %record.action, "Saved trade record to Redis");
        Ok(())
    }
}
