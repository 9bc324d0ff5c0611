//! Property-based tests for the P&L, ROE and liquidation math.
//!
//! These tests verify invariants hold under random inputs.

use perps_paper::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $0.01 to $10M
}

fn size_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $0.01 to $100k
}

fn leverage_strategy() -> impl Strategy<Value = u32> {
    1u32..=125u32
}

fn mmr_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=500i64).prop_map(|x| Decimal::new(x, 4)) // 0% to 5%
}

fn position(side: Side, entry: Decimal, size: Decimal, leverage: u32) -> Position {
    Position::new(
        side,
        Price::new_unchecked(entry),
        Quote::new(size),
        Leverage::new_unchecked(leverage),
        Timestamp::from_millis(0),
    )
}

proptest! {
    /// Unrealized PnL is zero when mark = entry
    #[test]
    fn pnl_zero_at_entry(
        entry in price_strategy(),
        size in size_strategy(),
        leverage in leverage_strategy(),
    ) {
        for side in [Side::Long, Side::Short] {
            let pos = position(side, entry, size, leverage);
            prop_assert!(calculate_unrealized_pnl(&pos, pos.entry_price).is_zero());
            prop_assert_eq!(calculate_roe(&pos, pos.entry_price), Decimal::ZERO);
        }
    }

    /// A long and a short of the same shape are mirror images
    #[test]
    fn long_short_symmetry(
        entry in price_strategy(),
        mark in price_strategy(),
        size in size_strategy(),
        leverage in leverage_strategy(),
    ) {
        let long = position(Side::Long, entry, size, leverage);
        let short = position(Side::Short, entry, size, leverage);
        let mark = Price::new_unchecked(mark);

        let long_pnl = calculate_unrealized_pnl(&long, mark);
        let short_pnl = calculate_unrealized_pnl(&short, mark);
        prop_assert_eq!(long_pnl.value(), -short_pnl.value());
    }

    /// PnL sign is correct for longs: profit when mark > entry
    #[test]
    fn pnl_sign_long(
        entry in price_strategy(),
        mark in price_strategy(),
        size in size_strategy(),
        leverage in leverage_strategy(),
    ) {
        let pos = position(Side::Long, entry, size, leverage);
        let pnl = calculate_unrealized_pnl(&pos, Price::new_unchecked(mark));

        if mark > entry {
            prop_assert!(pnl.value() > Decimal::ZERO, "Long should profit when mark > entry");
        } else if mark < entry {
            prop_assert!(pnl.value() < Decimal::ZERO, "Long should lose when mark < entry");
        }
    }

    /// ROE is exactly unrealized pnl over size, in percent
    #[test]
    fn roe_is_pnl_over_size(
        entry in price_strategy(),
        mark in price_strategy(),
        size in size_strategy(),
        leverage in leverage_strategy(),
    ) {
        let mark = Price::new_unchecked(mark);
        for side in [Side::Long, Side::Short] {
            let pos = position(side, entry, size, leverage);
            let expected = calculate_unrealized_pnl(&pos, mark).value() / pos.size.value() * dec!(100);
            prop_assert_eq!(calculate_roe(&pos, mark), expected);
        }
    }

    /// ROE equals the relative price move times leverage, in percent
    #[test]
    fn roe_is_leveraged_move(
        entry in price_strategy(),
        mark in price_strategy(),
        size in size_strategy(),
        leverage in 1u32..=20u32,
    ) {
        let pos = position(Side::Long, entry, size, leverage);
        let roe = calculate_roe(&pos, Price::new_unchecked(mark));
        let expected = (mark - entry) / entry * Decimal::from(leverage) * dec!(100);

        let diff = (roe - expected).abs();
        prop_assert!(diff < dec!(0.000001), "roe={}, expected={}", roe, expected);
    }

    /// A long can never lose more than the notional
    #[test]
    fn long_loss_bounded(
        entry in price_strategy(),
        mark in price_strategy(),
        size in size_strategy(),
        leverage in leverage_strategy(),
    ) {
        let pos = position(Side::Long, entry, size, leverage);
        let pnl = calculate_unrealized_pnl(&pos, Price::new_unchecked(mark));
        prop_assert!(pnl.value() >= -pos.notional().value() - dec!(0.000001));
    }

    /// Liquidation price for longs is below entry and never negative
    #[test]
    fn liquidation_price_long_below_entry(
        entry in price_strategy(),
        leverage in leverage_strategy(),
        mmr in mmr_strategy(),
    ) {
        let pos = position(Side::Long, entry, dec!(1000), leverage);
        let liq = calculate_liquidation_price(&pos, mmr);

        prop_assert!(liq < entry, "liq {} should be below entry {}", liq, entry);
        prop_assert!(liq >= Decimal::ZERO);
    }

    /// Liquidation price for shorts is above entry
    #[test]
    fn liquidation_price_short_above_entry(
        entry in price_strategy(),
        leverage in leverage_strategy(),
        mmr in mmr_strategy(),
    ) {
        let pos = position(Side::Short, entry, dec!(1000), leverage);
        prop_assert!(calculate_liquidation_price(&pos, mmr) > entry);
    }

    /// Higher leverage puts the liquidation price closer to entry
    #[test]
    fn higher_leverage_tighter_liquidation(
        entry in price_strategy(),
        low in 1u32..=50u32,
        bump in 1u32..=50u32,
        mmr in mmr_strategy(),
    ) {
        let loose = position(Side::Long, entry, dec!(1000), low);
        let tight = position(Side::Long, entry, dec!(1000), low + bump);

        prop_assert!(
            calculate_liquidation_price(&tight, mmr) > calculate_liquidation_price(&loose, mmr)
        );
    }

    /// Balance always equals the initial balance plus every realized pnl
    #[test]
    fn balance_conserved_over_round_trips(
        trades in proptest::collection::vec(
            (any::<bool>(), 1i64..50_000i64, 1i64..200_000_000i64, 1u32..=10u32),
            1..20,
        ),
    ) {
        let mut engine = Engine::default();
        let initial = engine.trading().balance();
        tick(&mut engine, dec!(50000));

        for (is_long, size_raw, exit_raw, leverage) in trades {
            let side = if is_long { Side::Long } else { Side::Short };
            let size = Decimal::new(size_raw, 2);
            if engine.open_market_position(side, size, leverage).is_err() {
                // only a drained balance may refuse the open
                prop_assert!(size > engine.trading().balance().value());
                continue;
            }

            tick(&mut engine, Decimal::new(exit_raw, 2));
            engine.close_market_position().unwrap();
            tick(&mut engine, dec!(50000));
        }

        let state = engine.trading();
        let summed: Quote = state.trade_history().iter().map(|t| t.realized_pnl).sum();
        prop_assert_eq!(state.realized_pnl(), summed);
        prop_assert_eq!(state.balance(), initial.add(summed));
        prop_assert_eq!(state.trade_history().len() as u64, state.total_trades());
        prop_assert!(state.winning_trades() + state.losing_trades() <= state.total_trades());
        prop_assert!(state.position().is_none());
    }

    /// A rejected open leaves every field untouched
    #[test]
    fn rejected_open_changes_nothing(
        size_raw in -1_000i64..=0i64,
        leverage in 0u32..=200u32,
    ) {
        let mut state = TradingState::default();
        let before = serde_json::to_string(&state).unwrap();

        let result = state.open_position(
            Side::Long,
            dec!(50000),
            Decimal::new(size_raw, 2),
            leverage,
            Timestamp::from_millis(0),
        );

        prop_assert!(result.is_err());
        prop_assert_eq!(serde_json::to_string(&state).unwrap(), before);
    }
}

fn tick(engine: &mut Engine, price: Decimal) {
    engine.update_price(price, dec!(50000));
}

#[cfg(test)]
mod edge_cases {
    use super::*;

    #[test]
    fn extreme_price_movements() {
        let pos = position(Side::Short, dec!(50000), dec!(10000), 100);

        // price goes 100x against a 100x short
        let pnl = calculate_unrealized_pnl(&pos, Price::new_unchecked(dec!(5000000)));
        assert_eq!(pnl.value(), dec!(-99000000));

        let roe = calculate_roe(&pos, Price::new_unchecked(dec!(5000000)));
        assert_eq!(roe, dec!(-990000));
    }

    #[test]
    fn one_x_long_liquidates_near_zero() {
        let pos = position(Side::Long, dec!(50000), dec!(1000), 1);
        assert_eq!(calculate_liquidation_price(&pos, Decimal::ZERO), Decimal::ZERO);
        assert!(calculate_liquidation_price(&pos, dec!(0.004)) > Decimal::ZERO);
    }

    #[test]
    fn tiny_size_keeps_precision() {
        let pos = position(Side::Long, dec!(0.01), dec!(0.01), 1);
        let pnl = calculate_unrealized_pnl(&pos, Price::new_unchecked(dec!(0.02)));
        assert_eq!(pnl.value(), dec!(0.01));
    }
}
