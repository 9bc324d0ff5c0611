// 9.0: latest mark price and 24h change, fed by the mini ticker.
// no sequencing: every update overwrites the previous one (last write wins).

use crate::types::Price;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceState {
    // 0 until the first tick arrives
    pub current_price: Decimal,
    pub price_change_24h: Decimal,
    // None when the reference open was 0 or the ratio overflows, i.e. the percentage is unavailable
    pub price_change_percent_24h: Option<Decimal>,
}

impl PriceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_price(&mut self, current_price: Decimal, reference_open_price: Decimal) {
        let change = current_price.checked_sub(reference_open_price);
        self.current_price = current_price;
        self.price_change_24h = change.unwrap_or(Decimal::ZERO);
        self.price_change_percent_24h = change
            .and_then(|c| c.checked_div(reference_open_price))
            .and_then(|ratio| ratio.checked_mul(dec!(100)));

        if change.is_none() {
            tracing::warn!(price = %current_price, open = %reference_open_price, "24h change overflowed");
        }

        tracing::debug!(
            price = %current_price,
            change = %self.price_change_24h,
            "price updated"
        );
    }

    pub fn has_price(&self) -> bool {
        self.current_price > Decimal::ZERO
    }

    // the mark used for pnl. None before the feed has delivered a positive price
    pub fn mark_price(&self) -> Option<Price> {
        Price::new(self.current_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_price() {
        let state = PriceState::new();
        assert!(!state.has_price());
        assert!(state.mark_price().is_none());
    }

    #[test]
    fn update_computes_change() {
        let mut state = PriceState::new();
        state.update_price(dec!(51000), dec!(50000));

        assert_eq!(state.current_price, dec!(51000));
        assert_eq!(state.price_change_24h, dec!(1000));
        assert_eq!(state.price_change_percent_24h, Some(dec!(2)));
        assert_eq!(state.mark_price().unwrap().value(), dec!(51000));
    }

    #[test]
    fn negative_change() {
        let mut state = PriceState::new();
        state.update_price(dec!(48000), dec!(50000));

        assert_eq!(state.price_change_24h, dec!(-2000));
        assert_eq!(state.price_change_percent_24h, Some(dec!(-4)));
    }

    #[test]
    fn zero_reference_leaves_percent_unavailable() {
        let mut state = PriceState::new();
        state.update_price(dec!(50000), Decimal::ZERO);

        assert_eq!(state.current_price, dec!(50000));
        assert_eq!(state.price_change_24h, dec!(50000));
        assert!(state.price_change_percent_24h.is_none());
    }

    #[test]
    fn huge_move_leaves_percent_unavailable() {
        let mut state = PriceState::new();
        state.update_price(dec!(1000000000000000000000000000), dec!(1));

        assert_eq!(state.current_price, dec!(1000000000000000000000000000));
        assert_eq!(state.price_change_24h, dec!(999999999999999999999999999));
        assert!(state.price_change_percent_24h.is_none());
    }

    #[test]
    fn opposite_extremes_do_not_panic() {
        let mut state = PriceState::new();
        state.update_price(Decimal::MAX, Decimal::MIN);

        assert_eq!(state.price_change_24h, Decimal::ZERO);
        assert!(state.price_change_percent_24h.is_none());
    }

    #[test]
    fn last_write_wins() {
        let mut state = PriceState::new();
        state.update_price(dec!(52000), dec!(50000));
        state.update_price(dec!(49000), dec!(50000));

        assert_eq!(state.current_price, dec!(49000));
    }
}
