// 9.1: OHLC series behind the chart. kline updates are upserts keyed by the bucket start:
// same bucket replaces the last candle, a newer bucket appends, an older one is dropped.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    // bucket start, unix seconds
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Appended,
    Replaced,
    // older than the last bucket, ignored
    Stale,
}

#[derive(Debug, Clone)]
pub struct CandleSeries {
    candles: VecDeque<Candle>,
    max_candles: usize,
}

impl CandleSeries {
    pub fn new(max_candles: usize) -> Self {
        Self {
            candles: VecDeque::new(),
            max_candles: max_candles.max(1),
        }
    }

    pub fn upsert(&mut self, candle: Candle) -> UpsertOutcome {
        let last_time = self.candles.back().map(|c| c.time);
        let outcome = match last_time {
            Some(last) if last == candle.time => {
                if let Some(slot) = self.candles.back_mut() {
                    *slot = candle;
                }
                UpsertOutcome::Replaced
            }
            Some(last) if candle.time < last => {
                tracing::debug!(time = candle.time, last, "stale candle ignored");
                UpsertOutcome::Stale
            }
            _ => {
                self.candles.push_back(candle);
                UpsertOutcome::Appended
            }
        };

        while self.candles.len() > self.max_candles {
            self.candles.pop_front();
        }

        outcome
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}
