// 8.0: dashboard engine. owns the price store, the trading store, the candle series
// and the event log, and wires feed events and user actions into them.
// deterministic: time only moves when the caller sets it.

mod config;
mod core;
mod positions;
mod pricing;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{DashboardSnapshot, EngineError, PositionMetrics};
