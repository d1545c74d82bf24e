use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch, used both as record id and request timestamp
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Trade direction, serialized the way the exchange expects it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the ticker to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSide {
    Ask,
    Bid,
}

impl PriceSide {
    pub fn field(&self) -> &'static str {
        match self {
            PriceSide::Ask => "ask",
            PriceSide::Bid => "bid",
        }
    }
}

/// One raw RSI reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorSample {
    pub id: i64,
    pub value: f64,
}

impl IndicatorSample {
    pub fn now(value: f64) -> Self {
        Self {
            id: now_millis(),
            value,
        }
    }
}

/// A decision that reached the execution step
///
/// `quantity` is 0 when the intent fired but nothing could be traded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: i64,
    /// RSI at decision time
    pub value: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u64,
    pub action: TradeAction,
}

impl TradeRecord {
    pub fn now(action: TradeAction, rsi: f64, price: Decimal, quantity: u64) -> Self {
        Self {
            id: now_millis(),
            value: rsi,
            price,
            quantity,
            action,
        }
    }

    pub fn was_submitted(&self) -> bool {
        self.quantity > 0
    }
}
