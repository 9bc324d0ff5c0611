//! Trading state store.
//!
//! Holds the virtual balance, the single open position, realized P&L and the
//! closed-trade history. Four transitions mutate it: open, close, reset and
//! clear-history. Each one validates everything up front and only then writes,
//! so a rejected call leaves the state exactly as it was.

use crate::liquidation::calculate_liquidation_price;
use crate::position::Position;
use crate::types::{Leverage, Price, Quote, Side, Timestamp, TradeId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingParams {
    pub initial_balance: Quote,
    // percent of balance pre-filled as the order size
    pub default_position_size_pct: Decimal,
    pub min_leverage: Leverage,
    pub max_leverage: Leverage,
    pub maintenance_margin_rate: Decimal,
}

impl Default for TradingParams {
    fn default() -> Self {
        Self {
            initial_balance: Quote::new(dec!(100_000)),
            default_position_size_pct: dec!(10),
            min_leverage: Leverage::new_unchecked(1),
            max_leverage: Leverage::new_unchecked(10),
            maintenance_margin_rate: dec!(0.004), // 0.4%, BTC/USDT perp
        }
    }
}

impl TradingParams {
    pub fn leverage_in_range(&self, leverage: u32) -> bool {
        leverage >= self.min_leverage.value() && leverage <= self.max_leverage.value()
    }

    // the order form slider: anything outside the bounds snaps to the nearest bound
    pub fn clamp_leverage(&self, requested: u32) -> Leverage {
        let clamped = requested.max(self.min_leverage.value()).min(self.max_leverage.value());
        Leverage::new(clamped).unwrap_or(self.min_leverage)
    }
}

/// One finished round trip. Never modified after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: TradeId,
    pub side: Side,
    pub entry_price: Price,
    pub exit_price: Price,
    pub size: Quote,
    pub leverage: Leverage,
    pub realized_pnl: Quote,
    pub pnl_percent: Decimal,
    pub opened_at: Timestamp,
    pub closed_at: Timestamp,
}

impl ClosedTrade {
    pub fn duration_millis(&self) -> i64 {
        self.closed_at.as_millis() - self.opened_at.as_millis()
    }

    pub fn is_win(&self) -> bool {
        self.realized_pnl.is_positive()
    }

    pub fn is_loss(&self) -> bool {
        self.realized_pnl.is_negative()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeStats {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub win_rate: Decimal,
    pub total_profit: Quote,
    pub total_loss: Quote,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("a {side} position is already open at {entry_price}")]
    PositionAlreadyOpen { side: Side, entry_price: Price },

    #[error("no open position")]
    NoOpenPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("entry price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("position size must be positive, got {0}")]
    NonPositiveSize(Decimal),

    #[error("leverage {leverage}x outside {min}..={max}")]
    LeverageOutOfRange { leverage: u32, min: Leverage, max: Leverage },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradingError {
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Quote, available: Quote },
}

/// Balance, open position and trade log. Only the transitions below mutate it.
#[derive(Debug, Clone, Serialize)]
pub struct TradingState {
    params: TradingParams,
    balance: Quote,
    position: Option<Position>,
    realized_pnl: Quote,
    // newest first
    trade_history: Vec<ClosedTrade>,
    total_trades: u64,
    winning_trades: u64,
    losing_trades: u64,
    next_trade_id: u64,
}

impl Default for TradingState {
    fn default() -> Self {
        Self::new(TradingParams::default())
    }
}

impl TradingState {
    pub fn new(params: TradingParams) -> Self {
        Self {
            balance: params.initial_balance,
            params,
            position: None,
            realized_pnl: Quote::zero(),
            trade_history: Vec::new(),
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            next_trade_id: 1,
        }
    }

    pub fn params(&self) -> &TradingParams {
        &self.params
    }

    pub fn balance(&self) -> Quote {
        self.balance
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn realized_pnl(&self) -> Quote {
        self.realized_pnl
    }

    pub fn trade_history(&self) -> &[ClosedTrade] {
        &self.trade_history
    }

    pub fn total_trades(&self) -> u64 {
        self.total_trades
    }

    pub fn winning_trades(&self) -> u64 {
        self.winning_trades
    }

    pub fn losing_trades(&self) -> u64 {
        self.losing_trades
    }

    // order form default: a fixed percent of the current balance
    pub fn default_position_size(&self) -> Quote {
        self.balance.mul(self.params.default_position_size_pct / dec!(100))
    }

    pub fn liquidation_price(&self) -> Option<Decimal> {
        self.position
            .as_ref()
            .map(|p| calculate_liquidation_price(p, self.params.maintenance_margin_rate))
    }

    /// NONE -> OPEN. Margin is not reserved; balance only moves on close.
    pub fn open_position(
        &mut self,
        side: Side,
        entry_price: Decimal,
        size: Decimal,
        leverage: u32,
        opened_at: Timestamp,
    ) -> Result<&Position, TradingError> {
        if let Some(existing) = &self.position {
            return Err(TransitionError::PositionAlreadyOpen {
                side: existing.side,
                entry_price: existing.entry_price,
            }
            .into());
        }

        let entry_price = Price::new(entry_price).ok_or(InputError::NonPositivePrice(entry_price))?;

        if size <= Decimal::ZERO {
            return Err(InputError::NonPositiveSize(size).into());
        }

        let leverage = match Leverage::new(leverage) {
            Some(lev) if self.params.leverage_in_range(leverage) => lev,
            _ => {
                return Err(InputError::LeverageOutOfRange {
                    leverage,
                    min: self.params.min_leverage,
                    max: self.params.max_leverage,
                }
                .into())
            }
        };

        let size = Quote::new(size);
        if size > self.balance {
            return Err(TradingError::InsufficientBalance {
                requested: size,
                available: self.balance,
            });
        }

        tracing::info!(
            side = %side,
            entry_price = %entry_price,
            size = %size,
            leverage = %leverage,
            "position opened"
        );

        Ok(&*self
            .position
            .insert(Position::new(side, entry_price, size, leverage, opened_at)))
    }

    /// OPEN -> NONE. `pnl` comes from the caller, computed at the same mark as `exit_price`.
    ///
    /// A `closed_at` earlier than the open time is clamped to it so durations never go negative.
    pub fn close_position(
        &mut self,
        pnl: Quote,
        exit_price: Price,
        closed_at: Timestamp,
    ) -> Result<&ClosedTrade, TradingError> {
        let position = self.position.take().ok_or(TransitionError::NoOpenPosition)?;

        let closed_at = if closed_at < position.opened_at {
            tracing::warn!(
                opened_at = position.opened_at.as_millis(),
                closed_at = closed_at.as_millis(),
                "close timestamp precedes open, clamping"
            );
            position.opened_at
        } else {
            closed_at
        };

        let trade = ClosedTrade {
            id: TradeId(self.next_trade_id),
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            size: position.size,
            leverage: position.leverage,
            realized_pnl: pnl,
            pnl_percent: pnl.value() / position.size.value() * dec!(100),
            opened_at: position.opened_at,
            closed_at,
        };

        self.next_trade_id += 1;
        self.balance = self.balance.add(pnl);
        self.realized_pnl = self.realized_pnl.add(pnl);
        self.total_trades += 1;
        if pnl.is_positive() {
            self.winning_trades += 1;
        } else if pnl.is_negative() {
            self.losing_trades += 1;
        }

        tracing::info!(
            id = %trade.id,
            side = %trade.side,
            exit_price = %exit_price,
            pnl = %pnl,
            balance = %self.balance,
            "position closed"
        );

        self.trade_history.insert(0, trade);
        Ok(&self.trade_history[0])
    }

    /// Back to the configured starting balance with nothing open and no history.
    /// Trade ids keep counting so an id is never reused.
    pub fn reset_trading(&mut self) {
        tracing::info!(balance = %self.params.initial_balance, "trading state reset");
        let next_trade_id = self.next_trade_id;
        *self = Self::new(self.params.clone());
        self.next_trade_id = next_trade_id;
    }

    /// Drops the log and the counters. Balance, realized P&L and any open position stay.
    pub fn clear_history(&mut self) {
        tracing::info!(cleared = self.trade_history.len(), "trade history cleared");
        self.trade_history.clear();
        self.total_trades = 0;
        self.winning_trades = 0;
        self.losing_trades = 0;
    }

    pub fn stats(&self) -> TradeStats {
        let win_rate = if self.total_trades > 0 {
            Decimal::from(self.winning_trades) / Decimal::from(self.total_trades) * dec!(100)
        } else {
            Decimal::ZERO
        };

        TradeStats {
            total_trades: self.total_trades,
            winning_trades: self.winning_trades,
            losing_trades: self.losing_trades,
            win_rate,
            total_profit: self.trade_history.iter().filter(|t| t.is_win()).map(|t| t.realized_pnl).sum(),
            total_loss: self.trade_history.iter().filter(|t| t.is_loss()).map(|t| t.realized_pnl).sum(),
        }
    }
}
