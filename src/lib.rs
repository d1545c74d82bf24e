// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod persistence;
pub mod strategy;

// Re-export commonly used types
pub use api::{CoinDcxClient, Exchange, IndicatorSource, TradingViewClient};
pub use error::{BotError, ErrorKind};
pub use execution::TradingLoop;
pub use models::*;
pub use strategy::HysteresisStrategy;

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
