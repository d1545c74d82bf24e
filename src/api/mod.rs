pub mod coindcx;
pub mod signer;
pub mod tradingview;

use crate::models::PriceSide;
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

pub use coindcx::{CoinDcxClient, OrderRequest, OrderResult, OrderType};
pub use signer::{sign_payload, RequestSigner, SignedBody};
pub use tradingview::TradingViewClient;

/// Authenticated exchange operations used by the trading loop.
///
/// Implementations never retry; a failed call fails the cycle.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Balance of `currency` truncated to `decimal_places`, `None` if the
    /// account has no entry for it.
    async fn get_balance(&self, currency: &str, decimal_places: u32) -> Result<Option<Decimal>>;

    /// Current ticker price for `market`, `None` if the market or side is missing.
    async fn get_price(&self, market: &str, side: PriceSide) -> Result<Option<Decimal>>;

    /// Place an order and hand back the raw response for inspection.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResult>;
}

/// Where the RSI comes from
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn fetch_rsi(&self, symbol: &str) -> Result<f64>;
}
