// 11.0: every state change produces an event. used as the dashboard's audit trail and
// to notify the presentation layer. rejected user actions are recorded too.

use crate::types::{Leverage, Price, Quote, Side, Timestamp, TradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Market data events
    PriceUpdated(PriceUpdatedEvent),
    CandleUpdated(CandleUpdatedEvent),

    // Position events
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),
    TransitionRejected(TransitionRejectedEvent),

    // Account events
    TradingReset(TradingResetEvent),
    HistoryCleared(HistoryClearedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdatedEvent {
    pub price: Decimal,
    pub change_24h: Decimal,
    pub change_percent_24h: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleUpdatedEvent {
    pub time: i64,
    pub close: Decimal,
    pub appended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub side: Side,
    pub entry_price: Price,
    pub size: Quote,
    pub leverage: Leverage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub trade_id: TradeId,
    pub side: Side,
    pub exit_price: Price,
    pub realized_pnl: Quote,
    pub new_balance: Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectedAction {
    Open,
    Close,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRejectedEvent {
    pub action: RejectedAction,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingResetEvent {
    pub balance: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryClearedEvent {
    pub trades_cleared: usize,
}
