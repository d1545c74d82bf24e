// Trading strategy module
pub mod hysteresis;

pub use hysteresis::{transition, HysteresisStrategy, Intents, StrategyState, Thresholds};
