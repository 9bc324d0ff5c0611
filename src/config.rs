// 7.0 config.rs: all settings in one place. loaded once at startup, never mutated after.
// 7.1 defaults mirror the BTC/USDT demo: $100k virtual balance, 1x..10x, 0.4% mmr.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::engine::EngineConfig;
use crate::trading::TradingParams;
use crate::types::{Leverage, Quote};

pub const BINANCE_WS_BASE: &str = "wss://stream.binance.com:9443/ws";

/** 7.2: stream endpoints. one websocket per stream */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    // 24h rolling ticker, drives the mark price
    pub mini_ticker_url: String,
    // 1m candles, drives the chart
    pub kline_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mini_ticker_url: format!("{BINANCE_WS_BASE}/btcusdt@miniTicker"),
            kline_url: format!("{BINANCE_WS_BASE}/btcusdt@kline_1m"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub trading: TradingParams,
    pub feed: FeedConfig,
    pub engine: EngineConfig,
}

impl DashboardConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    // defaults overridden by PERPS_* variables. call dotenvy first if a .env file should count
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let trading = &mut config.trading;

        if let Some(v) = env_var::<Decimal>("PERPS_INITIAL_BALANCE")? {
            trading.initial_balance = Quote::new(v);
        }
        if let Some(v) = env_var::<Decimal>("PERPS_DEFAULT_SIZE_PCT")? {
            trading.default_position_size_pct = v;
        }
        if let Some(v) = env_var::<u32>("PERPS_MIN_LEVERAGE")? {
            trading.min_leverage = leverage_from_env("PERPS_MIN_LEVERAGE", v)?;
        }
        if let Some(v) = env_var::<u32>("PERPS_MAX_LEVERAGE")? {
            trading.max_leverage = leverage_from_env("PERPS_MAX_LEVERAGE", v)?;
        }
        if let Some(v) = env_var::<Decimal>("PERPS_MMR")? {
            trading.maintenance_margin_rate = v;
        }
        if let Ok(url) = env::var("PERPS_TICKER_URL") {
            config.feed.mini_ticker_url = url;
        }
        if let Ok(url) = env::var("PERPS_KLINE_URL") {
            config.feed.kline_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let trading = &self.trading;

        if trading.initial_balance.value() <= Decimal::ZERO {
            return Err(ConfigError::InvalidTrading {
                reason: "Initial balance must be positive".to_string(),
            });
        }

        if trading.default_position_size_pct <= Decimal::ZERO
            || trading.default_position_size_pct > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::InvalidTrading {
                reason: "Default position size must be within (0, 100] percent".to_string(),
            });
        }

        if trading.min_leverage > trading.max_leverage {
            return Err(ConfigError::InvalidTrading {
                reason: "Min leverage must not exceed max leverage".to_string(),
            });
        }

        // the liquidation estimate needs 1 + mmr > 0, and a rate of 100% is meaningless
        if trading.maintenance_margin_rate < Decimal::ZERO
            || trading.maintenance_margin_rate >= Decimal::ONE
        {
            return Err(ConfigError::InvalidTrading {
                reason: "Maintenance margin rate must be in [0, 1)".to_string(),
            });
        }

        for url in [&self.feed.mini_ticker_url, &self.feed.kline_url] {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(ConfigError::InvalidFeed {
                    reason: format!("Not a websocket url: {url}"),
                });
            }
        }

        if self.engine.max_events == 0 || self.engine.max_candles == 0 {
            return Err(ConfigError::InvalidEngine {
                reason: "Event and candle capacity must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(None),
    }
}

fn leverage_from_env(key: &'static str, value: u32) -> Result<Leverage, ConfigError> {
    Leverage::new(value).ok_or(ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("could not parse config: {reason}")]
    Parse { reason: String },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid trading config: {reason}")]
    InvalidTrading { reason: String },

    #[error("invalid feed config: {reason}")]
    InvalidFeed { reason: String },

    #[error("invalid engine config: {reason}")]
    InvalidEngine { reason: String },
}
