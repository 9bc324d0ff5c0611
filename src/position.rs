// 4.0: the open position and the pnl math over it.
// pnl = side * (mark - entry) / entry * size * leverage. size is USD before leverage.

use crate::liquidation::calculate_liquidation_price;
use crate::types::{Leverage, Price, Quote, Side, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A leveraged position. Immutable once opened: no averaging, no partial closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_price: Price,
    pub size: Quote,
    pub leverage: Leverage,
    pub opened_at: Timestamp,
}

impl Position {
    pub fn new(
        side: Side,
        entry_price: Price,
        size: Quote,
        leverage: Leverage,
        opened_at: Timestamp,
    ) -> Self {
        Self {
            side,
            entry_price,
            size,
            leverage,
            opened_at,
        }
    }

    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    // size * leverage: the actual market exposure
    pub fn notional(&self) -> Quote {
        self.size.mul(self.leverage.as_decimal())
    }

    // 4.1: paper gains/losses at the given mark
    pub fn unrealized_pnl(&self, mark_price: Price) -> Quote {
        calculate_unrealized_pnl(self, mark_price)
    }

    pub fn roe(&self, mark_price: Price) -> Decimal {
        calculate_roe(self, mark_price)
    }

    pub fn liquidation_price(&self, maintenance_margin_rate: Decimal) -> Decimal {
        calculate_liquidation_price(self, maintenance_margin_rate)
    }
}

// 4.2: the pnl formula. relative move times leveraged notional, negated for shorts.
pub fn calculate_unrealized_pnl(position: &Position, mark_price: Price) -> Quote {
    let price_change = mark_price.value() - position.entry_price.value();
    let relative_move = price_change / position.entry_price.value();
    Quote::new(position.side.sign() * relative_move * position.notional().value())
}

// 4.2.1: same formula, None on overflow. used wherever the mark comes straight off the feed
pub fn checked_unrealized_pnl(position: &Position, mark_price: Price) -> Option<Quote> {
    let entry = position.entry_price.value();
    let relative_move = mark_price.value().checked_sub(entry)?.checked_div(entry)?;
    let notional = position.size.value().checked_mul(position.leverage.as_decimal())?;
    position
        .side
        .sign()
        .checked_mul(relative_move)?
        .checked_mul(notional)
        .map(Quote::new)
}

pub fn checked_roe(position: &Position, mark_price: Price) -> Option<Decimal> {
    checked_unrealized_pnl(position, mark_price)?
        .value()
        .checked_div(position.size.value())?
        .checked_mul(dec!(100))
}

// 4.3: ROE against the pre-leverage size, not the margin. keeps 10% meaning 10% of what was allocated.
pub fn calculate_roe(position: &Position, mark_price: Price) -> Decimal {
    let pnl = calculate_unrealized_pnl(position, mark_price);
    pnl.value() / position.size.value() * dec!(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_position(side: Side) -> Position {
        Position::new(
            side,
            Price::new_unchecked(dec!(50000)),
            Quote::new(dec!(10000)),
            Leverage::new(5).unwrap(),
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn notional_includes_leverage() {
        let pos = test_position(Side::Long);
        assert_eq!(pos.notional().value(), dec!(50000));
    }

    #[test]
    fn unrealized_pnl_long_profit() {
        let pos = test_position(Side::Long);
        let mark = Price::new_unchecked(dec!(51000)); // +2%

        // 0.02 * 50000 notional
        assert_eq!(pos.unrealized_pnl(mark).value(), dec!(1000));
    }

    #[test]
    fn unrealized_pnl_long_loss() {
        let pos = test_position(Side::Long);
        let mark = Price::new_unchecked(dec!(49000));

        assert_eq!(pos.unrealized_pnl(mark).value(), dec!(-1000));
    }

    #[test]
    fn unrealized_pnl_short_profit() {
        let pos = test_position(Side::Short);
        let mark = Price::new_unchecked(dec!(48000)); // -4%

        assert_eq!(pos.unrealized_pnl(mark).value(), dec!(2000));
    }

    #[test]
    fn pnl_zero_at_entry() {
        for side in [Side::Long, Side::Short] {
            let pos = test_position(side);
            assert!(pos.unrealized_pnl(pos.entry_price).is_zero());
        }
    }

    #[test]
    fn roe_is_against_size_not_margin() {
        let pos = test_position(Side::Long);
        let mark = Price::new_unchecked(dec!(51000));

        // 1000 / 10000 * 100, not 1000 / 2000 * 100
        assert_eq!(pos.roe(mark), dec!(10));
    }

    #[test]
    fn roe_short_loss() {
        let pos = test_position(Side::Short);
        let mark = Price::new_unchecked(dec!(52500)); // +5% against the short

        assert_eq!(pos.unrealized_pnl(mark).value(), dec!(-2500));
        assert_eq!(pos.roe(mark), dec!(-25));
    }

    #[test]
    fn position_serialization() {
        let pos = test_position(Side::Short);
        let json = serde_json::to_string(&pos).unwrap();
        assert!(json.contains("\"SHORT\""));
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pos);
    }

    #[test]
    fn checked_matches_plain_math() {
        let pos = test_position(Side::Short);
        let mark = Price::new_unchecked(dec!(48000));

        assert_eq!(checked_unrealized_pnl(&pos, mark), Some(calculate_unrealized_pnl(&pos, mark)));
        assert_eq!(checked_roe(&pos, mark), Some(calculate_roe(&pos, mark)));
    }

    #[test]
    fn checked_overflow_is_none() {
        let pos = Position::new(
            Side::Long,
            Price::new_unchecked(dec!(1)),
            Quote::new(dec!(100000)),
            Leverage::new(10).unwrap(),
            Timestamp::from_millis(0),
        );
        let mark = Price::new_unchecked(dec!(100000000000000000000000));

        assert!(checked_unrealized_pnl(&pos, mark).is_none());
        assert!(checked_roe(&pos, mark).is_none());
    }
}
