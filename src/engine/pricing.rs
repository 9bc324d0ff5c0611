//! Market data operations.

use super::core::Engine;
use crate::candles::{Candle, UpsertOutcome};
use crate::events::{CandleUpdatedEvent, EventPayload, PriceUpdatedEvent};
use crate::price_feed::{FeedEvent, FeedReceiver};
use rust_decimal::Decimal;

impl Engine {
    /// Overwrite the mark and the 24h change. Last write wins.
    pub fn update_price(&mut self, current_price: Decimal, reference_open_price: Decimal) {
        self.price.update_price(current_price, reference_open_price);

        self.emit_event(EventPayload::PriceUpdated(PriceUpdatedEvent {
            price: self.price.current_price,
            change_24h: self.price.price_change_24h,
            change_percent_24h: self.price.price_change_percent_24h,
        }));
    }

    /// Feed a kline into the chart series. Stale buckets are dropped without an event.
    pub fn upsert_candle(&mut self, candle: Candle) -> UpsertOutcome {
        let outcome = self.candles.upsert(candle);

        if outcome != UpsertOutcome::Stale {
            self.emit_event(EventPayload::CandleUpdated(CandleUpdatedEvent {
                time: candle.time,
                close: candle.close,
                appended: outcome == UpsertOutcome::Appended,
            }));
        }

        outcome
    }

    pub fn apply_feed_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::PriceTick(tick) => {
                self.update_price(tick.current_price.value(), tick.open_price.value())
            }
            FeedEvent::CandleUpdate(candle) => {
                self.upsert_candle(candle);
            }
        }
    }

    /// Apply everything queued on the channel without waiting. Returns how many events were applied.
    pub fn drain_feed(&mut self, rx: &mut FeedReceiver) -> usize {
        let mut applied = 0;
        while let Ok(event) = rx.try_recv() {
            self.apply_feed_event(event);
            applied += 1;
        }
        applied
    }
}
