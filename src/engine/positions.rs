//! Position actions from the order form.

use super::core::Engine;
use super::results::{EngineError, PositionMetrics};
use crate::events::{
    EventPayload, PositionClosedEvent, PositionOpenedEvent, RejectedAction, TransitionRejectedEvent,
};
use crate::liquidation::liquidation_buffer_percent;
use crate::position::{checked_roe, checked_unrealized_pnl, Position};
use crate::trading::{ClosedTrade, TradingError, TransitionError};
use crate::types::Side;
use rust_decimal::Decimal;

impl Engine {
    /// Open at the current mark. Fails before the first price tick.
    pub fn open_market_position(
        &mut self,
        side: Side,
        size: Decimal,
        leverage: u32,
    ) -> Result<Position, EngineError> {
        let mark = match self.require_mark() {
            Ok(mark) => mark,
            Err(e) => {
                self.reject(RejectedAction::Open, &e);
                return Err(e);
            }
        };
        self.open_position(side, mark.value(), size, leverage)
    }

    /// Open at an explicit entry price, stamped with the engine clock.
    pub fn open_position(
        &mut self,
        side: Side,
        entry_price: Decimal,
        size: Decimal,
        leverage: u32,
    ) -> Result<Position, EngineError> {
        let opened_at = self.current_time;
        let opened = self
            .trading
            .open_position(side, entry_price, size, leverage, opened_at)
            .map(Position::clone);
        let position = match opened {
            Ok(position) => position,
            Err(e) => {
                let e = EngineError::from(e);
                self.reject(RejectedAction::Open, &e);
                return Err(e);
            }
        };

        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            side: position.side,
            entry_price: position.entry_price,
            size: position.size,
            leverage: position.leverage,
        }));

        Ok(position)
    }

    /// Close at the current mark, realizing the P&L shown on screen.
    pub fn close_market_position(&mut self) -> Result<ClosedTrade, EngineError> {
        // 8.3: the transition check comes first so a missing position is reported as such
        let Some(position) = self.trading.position().cloned() else {
            let e = EngineError::Trading(TradingError::from(TransitionError::NoOpenPosition));
            self.reject(RejectedAction::Close, &e);
            return Err(e);
        };

        let mark = match self.require_mark() {
            Ok(mark) => mark,
            Err(e) => {
                self.reject(RejectedAction::Close, &e);
                return Err(e);
            }
        };

        let Some(pnl) = checked_unrealized_pnl(&position, mark) else {
            let e = EngineError::PnlOverflow { mark_price: mark };
            self.reject(RejectedAction::Close, &e);
            return Err(e);
        };
        let trade = self.trading.close_position(pnl, mark, self.current_time)?.clone();

        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            trade_id: trade.id,
            side: trade.side,
            exit_price: trade.exit_price,
            realized_pnl: trade.realized_pnl,
            new_balance: self.trading.balance(),
        }));

        Ok(trade)
    }

    /// None when flat, before the first price tick, or when the mark is too far out to value.
    pub fn position_metrics(&self) -> Option<PositionMetrics> {
        let position = self.trading.position()?;
        let mark = self.price.mark_price()?;
        let mmr = self.trading.params().maintenance_margin_rate;

        let (Some(unrealized_pnl), Some(roe)) =
            (checked_unrealized_pnl(position, mark), checked_roe(position, mark))
        else {
            tracing::debug!(mark = %mark, "position metrics overflowed");
            return None;
        };

        Some(PositionMetrics {
            mark_price: mark,
            notional: position.notional(),
            unrealized_pnl,
            roe,
            liquidation_price: position.liquidation_price(mmr),
            liquidation_buffer_pct: liquidation_buffer_percent(position, mark.value(), mmr),
        })
    }

    fn reject(&mut self, action: RejectedAction, error: &EngineError) {
        tracing::warn!(?action, %error, "action rejected");
        self.emit_event(EventPayload::TransitionRejected(TransitionRejectedEvent {
            action,
            reason: error.to_string(),
        }));
    }
}
