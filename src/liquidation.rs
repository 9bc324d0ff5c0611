//! Approximate liquidation price.
//!
//! The dashboard shows where a position would roughly be wiped out:
//! `entry * (1 -/+ 1 / (leverage * (1 + mmr)))`. Fees, funding and partial
//! margin are ignored, so this is a display estimate and not an exchange formula.

use crate::position::Position;
use crate::types::Side;
use rust_decimal::Decimal;

/// Fraction of the entry price the mark can move against the position before liquidation.
pub fn liquidation_factor(leverage: Decimal, maintenance_margin_rate: Decimal) -> Decimal {
    Decimal::ONE / (leverage * (Decimal::ONE + maintenance_margin_rate))
}

/// Calculates the price at which the position is considered liquidated.
///
/// Below entry for longs, above entry for shorts. A 1x long with a zero rate
/// lands at exactly zero.
pub fn calculate_liquidation_price(position: &Position, maintenance_margin_rate: Decimal) -> Decimal {
    let factor = liquidation_factor(position.leverage.as_decimal(), maintenance_margin_rate);
    let entry = position.entry_price.value();

    match position.side {
        Side::Long => entry * (Decimal::ONE - factor),
        Side::Short => entry * (Decimal::ONE + factor),
    }
}

/// Distance from mark to liquidation as a percentage of mark. Negative once crossed.
pub fn liquidation_buffer_percent(position: &Position, mark_price: Decimal, maintenance_margin_rate: Decimal) -> Decimal {
    if mark_price.is_zero() {
        return Decimal::ZERO;
    }
    let liq = calculate_liquidation_price(position, maintenance_margin_rate);
    let distance = match position.side {
        Side::Long => mark_price - liq,
        Side::Short => liq - mark_price,
    };
    distance / mark_price * Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Leverage, Price, Quote, Timestamp};
    use rust_decimal_macros::dec;

    fn position(side: Side, leverage: u32) -> Position {
        Position::new(
            side,
            Price::new_unchecked(dec!(50000)),
            Quote::new(dec!(10000)),
            Leverage::new(leverage).unwrap(),
            Timestamp::from_millis(0),
        )
    }

    #[test]
    fn long_liquidation_without_margin_rate() {
        // 10x, no mmr: a 10% drop wipes the position
        let liq = calculate_liquidation_price(&position(Side::Long, 10), Decimal::ZERO);
        assert_eq!(liq, dec!(45000));
    }

    #[test]
    fn short_liquidation_without_margin_rate() {
        let liq = calculate_liquidation_price(&position(Side::Short, 10), Decimal::ZERO);
        assert_eq!(liq, dec!(55000));
    }

    #[test]
    fn margin_rate_pulls_liquidation_closer_to_entry() {
        let mmr = dec!(0.004);
        let long = calculate_liquidation_price(&position(Side::Long, 10), mmr);
        let short = calculate_liquidation_price(&position(Side::Short, 10), mmr);

        assert!(long > dec!(45000) && long < dec!(50000));
        assert!(short < dec!(55000) && short > dec!(50000));
    }

    #[test]
    fn one_x_long_liquidates_at_zero() {
        let liq = calculate_liquidation_price(&position(Side::Long, 1), Decimal::ZERO);
        assert_eq!(liq, Decimal::ZERO);
    }

    #[test]
    fn factor_matches_formula() {
        // 1 / (5 * 1.004) = 1 / 5.02
        assert_eq!(liquidation_factor(dec!(5), dec!(0.004)), Decimal::ONE / dec!(5.02));
    }

    #[test]
    fn buffer_shrinks_as_price_approaches_liquidation() {
        let pos = position(Side::Long, 10);
        let near_entry = liquidation_buffer_percent(&pos, dec!(50000), Decimal::ZERO);
        let near_liq = liquidation_buffer_percent(&pos, dec!(45500), Decimal::ZERO);

        assert_eq!(near_entry, dec!(10));
        assert!(near_liq < near_entry);
        assert!(liquidation_buffer_percent(&pos, dec!(44000), Decimal::ZERO) < Decimal::ZERO);
    }
}
