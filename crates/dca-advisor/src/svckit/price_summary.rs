//! Price Summary
//!
//! Current price plus 24h and 7d percentage changes, derived from a cached
//! series. Pure: the same series always yields the same summary.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::error::{AdvisorError, Result};
use crate::model::{PriceSeries, PriceSummary, TimeFrame};

/// Span above which the 24-point reference no longer looks like "24 hours ago"
const MAX_HOURS_24_SPAN_HOURS: i64 = 48;

/// `(current - past) / past * 100`.
///
/// `None` when `past` is zero or the change does not fit in a `Decimal`.
pub fn percent_change(past: Decimal, current: Decimal) -> Option<Decimal> {
    current
        .checked_sub(past)
        .and_then(|delta| delta.checked_div(past))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
}

pub fn summarize(series: &PriceSeries) -> Result<PriceSummary> {
    let token = series.token();
    let current = series.latest();

    let day_ago = series
        .reference(TimeFrame::Hours24)
        .ok_or_else(|| AdvisorError::InsufficientHistory {
            token: token.to_string(),
            needed: TimeFrame::HOURS_24_OFFSET,
            available: series.len(),
        })?;
    let week_ago = series.oldest();

    if current.timestamp - day_ago.timestamp > Duration::hours(MAX_HOURS_24_SPAN_HOURS) {
        warn!(
            token,
            span_hours = (current.timestamp - day_ago.timestamp).num_hours(),
            "Series is not hourly; 24h change covers a longer span"
        );
    }

    let change = |past: Decimal| {
        percent_change(past, current.price)
            .ok_or_else(|| AdvisorError::PriceUnavailable(token.to_string()))
    };

    Ok(PriceSummary {
        current: current.price,
        change_24h: change(day_ago.price)?,
        change_7d: change(week_ago.price)?,
    })
}
