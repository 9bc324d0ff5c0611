//! Display formatting for prices, USD amounts, percentages and durations.
//!
//! Downstream rendering and tests depend on these exact strings: USD always has
//! two decimals, percentages always carry a sign.

use crate::types::Timestamp;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

fn fixed(value: Decimal, decimals: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimals);
    rounded.to_string()
}

// "1234567" -> "1,234,567"
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Price with a fixed number of decimals, no grouping. `format_price(50000.456, 2)` is `"50000.46"`.
pub fn format_price(price: Decimal, decimals: u32) -> String {
    fixed(price, decimals)
}

/// USD with a `$` prefix, thousands separators and two decimals. Negatives render as `$-1,234.50`.
pub fn format_usd(value: Decimal) -> String {
    let text = fixed(value.abs(), 2);
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if value.is_sign_negative() && !text.trim_matches(|c| c == '0' || c == '.').is_empty() {
        "-"
    } else {
        ""
    };
    format!("${sign}{}.{frac_part}", group_thousands(int_part))
}

/// Percentage with an explicit sign and two decimals: `+10.00%`, `-2.50%`, `+0.00%`.
pub fn format_percentage(value: Decimal) -> String {
    let sign = if value >= Decimal::ZERO { '+' } else { '-' };
    format!("{sign}{}%", fixed(value.abs(), 2))
}

/// Trade duration: `45s`, `3m 12s`, or `2h 5m` once past the hour.
pub fn format_duration(millis: i64) -> String {
    let millis = millis.max(0);
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    if minutes > 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Short UTC timestamp for the history table, e.g. `Oct 19, 10:30:15 AM`.
pub fn format_timestamp(timestamp: Timestamp) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp.as_millis()) {
        Some(dt) => dt.format("%b %-d, %I:%M:%S %p").to_string(),
        None => "-".to_string(),
    }
}
