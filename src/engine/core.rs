// 8.0 engine/core.rs: main engine. holds the price store, trading store, chart series, event log.

use super::results::{DashboardSnapshot, EngineError};
use crate::candles::CandleSeries;
use crate::config::DashboardConfig;
use crate::events::{Event, EventId, EventPayload, HistoryClearedEvent, TradingResetEvent};
use crate::price::PriceState;
use crate::trading::TradingState;
use crate::types::{Price, Timestamp};

use super::config::EngineConfig;

/** 8.1: main engine struct. all dashboard state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) price: PriceState,
    pub(super) trading: TradingState,
    pub(super) candles: CandleSeries,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl Engine {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            candles: CandleSeries::new(config.engine.max_candles),
            trading: TradingState::new(config.trading),
            config: config.engine,
            price: PriceState::new(),
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis().saturating_add(millis));
    }

    pub fn price(&self) -> &PriceState {
        &self.price
    }

    pub fn trading(&self) -> &TradingState {
        &self.trading
    }

    pub fn candles(&self) -> &CandleSeries {
        &self.candles
    }

    // 8.2: account-level actions. both always succeed
    pub fn reset_trading(&mut self) {
        self.trading.reset_trading();
        let balance = self.trading.balance();
        self.emit_event(EventPayload::TradingReset(TradingResetEvent { balance }));
    }

    pub fn clear_history(&mut self) {
        let trades_cleared = self.trading.trade_history().len();
        self.trading.clear_history();
        self.emit_event(EventPayload::HistoryCleared(HistoryClearedEvent { trades_cleared }));
    }

    /// Everything the dashboard renders, in one serializable value.
    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            time: self.current_time,
            price: self.price.clone(),
            balance: self.trading.balance(),
            realized_pnl: self.trading.realized_pnl(),
            position: self.trading.position().cloned(),
            metrics: self.position_metrics(),
            stats: self.trading.stats(),
            last_candle: self.candles.last().copied(),
        }
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        tracing::trace!(id = event.id.0, payload = ?event.payload, "event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }

    // shared by the position paths
    pub(super) fn require_mark(&self) -> Result<Price, EngineError> {
        self.price.mark_price().ok_or(EngineError::NoMarkPrice)
    }
}
