// Market data feed adapters
//
// The stores never see raw feed messages. An adapter turns one wire message into a
// typed FeedEvent, validating it on the way, and the events cross a channel to
// whoever owns the stores. Transport (websocket, replay file, test script) is not
// this module's concern.

use crate::candles::Candle;
use crate::types::{Price, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::mpsc;

/// Latest trade price plus the rolling 24h open it is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTick {
    pub current_price: Price,
    pub open_price: Price,
    pub event_time: Option<Timestamp>,
}

/// Typed output of every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedEvent {
    PriceTick(PriceTick),
    CandleUpdate(Candle),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("malformed feed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("field {field} is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field {field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: Decimal },

    #[error("expected {expected} event, got {actual:?}")]
    UnexpectedEvent { expected: &'static str, actual: String },

    #[error("feed channel closed")]
    ChannelClosed,
}

pub type FeedSender = mpsc::UnboundedSender<FeedEvent>;
pub type FeedReceiver = mpsc::UnboundedReceiver<FeedEvent>;

/// The boundary between transport and state: adapters push, the engine drains.
pub fn feed_channel() -> (FeedSender, FeedReceiver) {
    mpsc::unbounded_channel()
}

/// Implement this for each stream the dashboard consumes.
pub trait FeedAdapter {
    /// Human readable name, used in logs
    fn name(&self) -> &str;

    /// Where a live connector should subscribe
    fn stream_url(&self) -> &str;

    /// Parse and validate one raw message
    fn parse(&self, raw: &str) -> Result<FeedEvent, FeedError>;
}

/// Parse a raw message and push the event. Nothing is sent when parsing fails.
pub fn forward(adapter: &dyn FeedAdapter, raw: &str, tx: &FeedSender) -> Result<FeedEvent, FeedError> {
    let event = adapter.parse(raw)?;
    tx.send(event).map_err(|_| FeedError::ChannelClosed)?;
    Ok(event)
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, FeedError> {
    Decimal::from_str(value).map_err(|_| FeedError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_price(field: &'static str, value: &str) -> Result<Price, FeedError> {
    let parsed = parse_decimal(field, value)?;
    Price::new(parsed).ok_or(FeedError::NonPositive { field, value: parsed })
}

// Binance sends numbers as strings
#[derive(Debug, Deserialize)]
struct MiniTickerMessage {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "E", default)]
    event_time: Option<i64>,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "o")]
    open: String,
}

#[derive(Debug, Deserialize)]
struct KlineMessage {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "k")]
    kline: KlinePayload,
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    // bucket start, millis
    #[serde(rename = "t")]
    start_time: i64,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
}

/// 24h rolling mini ticker (`<symbol>@miniTicker`). Feeds the price store.
#[derive(Debug, Clone)]
pub struct MiniTickerAdapter {
    url: String,
}

impl MiniTickerAdapter {
    pub const EVENT_TYPE: &'static str = "24hrMiniTicker";

    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl FeedAdapter for MiniTickerAdapter {
    fn name(&self) -> &str {
        "mini_ticker"
    }

    fn stream_url(&self) -> &str {
        &self.url
    }

    fn parse(&self, raw: &str) -> Result<FeedEvent, FeedError> {
        let msg: MiniTickerMessage = serde_json::from_str(raw)?;
        if msg.event_type != Self::EVENT_TYPE {
            return Err(FeedError::UnexpectedEvent {
                expected: Self::EVENT_TYPE,
                actual: msg.event_type,
            });
        }

        // a positive open keeps the 24h percentage defined downstream
        Ok(FeedEvent::PriceTick(PriceTick {
            current_price: parse_price("c", &msg.close)?,
            open_price: parse_price("o", &msg.open)?,
            event_time: msg.event_time.map(Timestamp::from_millis),
        }))
    }
}

/// Candlestick stream (`<symbol>@kline_<interval>`). Feeds the chart series.
#[derive(Debug, Clone)]
pub struct KlineAdapter {
    url: String,
}

impl KlineAdapter {
    pub const EVENT_TYPE: &'static str = "kline";

    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl FeedAdapter for KlineAdapter {
    fn name(&self) -> &str {
        "kline"
    }

    fn stream_url(&self) -> &str {
        &self.url
    }

    fn parse(&self, raw: &str) -> Result<FeedEvent, FeedError> {
        let msg: KlineMessage = serde_json::from_str(raw)?;
        if msg.event_type != Self::EVENT_TYPE {
            return Err(FeedError::UnexpectedEvent {
                expected: Self::EVENT_TYPE,
                actual: msg.event_type,
            });
        }

        let k = msg.kline;
        Ok(FeedEvent::CandleUpdate(Candle {
            time: Timestamp::from_millis(k.start_time).as_secs(),
            open: parse_price("o", &k.open)?.value(),
            high: parse_price("h", &k.high)?.value(),
            low: parse_price("l", &k.low)?.value(),
            close: parse_price("c", &k.close)?.value(),
        }))
    }
}
