// Order execution and the control loop
pub mod executor;
pub mod shutdown;
pub mod sizing;
pub mod trading_loop;

pub use executor::{plan_order, ExecutionAction, ExecutionDecision};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use trading_loop::{CycleReport, LoopConfig, TradingLoop};
