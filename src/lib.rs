// perps-paper: paper trading core for a perpetual futures dashboard.
// one market, one position at a time, virtual balance. no orders reach an exchange.
// all state changes are deterministic; the only I/O is the optional live feed.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Side, Price, Quote, Leverage, Timestamp, TradeId
//   4.x  position.rs: position struct, unrealized pnl, roe
//   6.x  liquidation.rs: liquidation price estimate, buffer to liquidation
//   7.x  config.rs: trading params, feed urls, env overrides
//   8.x  engine/: dashboard engine: feed events, market actions, metrics
//   9.0  price.rs: mark price and 24h change
//   9.1  candles.rs: OHLC series for the chart
//   9.2  price_feed.rs + live.rs: feed adapters, websocket transport (feature "live")
//   10.x trading.rs: balance, position lifecycle, trade history
//   11.x events.rs: state transition events for audit
//   12.x format.rs: display helpers for prices, usd, percentages, times

// core modules
pub mod candles;
pub mod engine;
pub mod events;
pub mod liquidation;
pub mod position;
pub mod price;
pub mod trading;
pub mod types;

// presentation
pub mod format;

// integration modules
pub mod config;
#[cfg(feature = "live")]
pub mod live;
pub mod price_feed;

// re exports for convenience
pub use candles::*;
pub use engine::*;
pub use events::*;
pub use format::*;
pub use liquidation::*;
pub use position::*;
pub use price::*;
pub use trading::*;
pub use types::*;
pub use config::{ConfigError, DashboardConfig, FeedConfig};
pub use price_feed::{
    feed_channel, forward, FeedAdapter, FeedError, FeedEvent, FeedReceiver, FeedSender, KlineAdapter,
    MiniTickerAdapter, PriceTick,
};
