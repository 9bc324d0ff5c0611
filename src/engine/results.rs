// 8.0.2: result types and errors for engine operations.

use crate::candles::Candle;
use crate::position::Position;
use crate::price::PriceState;
use crate::trading::{TradeStats, TradingError};
use crate::types::{Price, Quote, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;

/// Live numbers for the open position at the current mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionMetrics {
    pub mark_price: Price,
    pub notional: Quote,
    pub unrealized_pnl: Quote,
    pub roe: Decimal,
    pub liquidation_price: Decimal,
    // distance to liquidation as a percent of the mark. negative once crossed
    pub liquidation_buffer_pct: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub time: Timestamp,
    pub price: PriceState,
    pub balance: Quote,
    pub realized_pnl: Quote,
    pub position: Option<Position>,
    pub metrics: Option<PositionMetrics>,
    pub stats: TradeStats,
    pub last_candle: Option<Candle>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("No mark price received yet")]
    NoMarkPrice,

    #[error("P&L at mark {mark_price} is out of range")]
    PnlOverflow { mark_price: Price },

    #[error("Trading error: {0}")]
    Trading(#[from] TradingError),
}
