//! Mock Price Source
//!
//! For testing and offline demo runs. Serves hourly series from memory and
//! counts how often each token was requested.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use super::PriceSource;
use crate::error::{AdvisorError, Result};
use crate::model::{PricePoint, PriceSeries};

/// In-memory price source with scripted series and failures
#[derive(Default)]
pub struct MockPriceSource {
    /// Prices per token, oldest first, one point per hour ending now
    series: HashMap<String, Vec<Decimal>>,

    /// Tokens whose fetch fails as if retries were exhausted
    failing: HashSet<String>,

    calls: Mutex<HashMap<String, usize>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `prices` (oldest first) for `token`
    pub fn with_prices(mut self, token: impl Into<String>, prices: Vec<Decimal>) -> Self {
        self.series.insert(token.into(), prices);
        self
    }

    /// Make every fetch of `token` fail
    pub fn with_failure(mut self, token: impl Into<String>) -> Self {
        self.failing.insert(token.into());
        self
    }

    /// Seven days of hourly prices for a handful of large caps
    pub fn demo() -> Self {
        // (token, price now, 7d trend in percent)
        let tokens = [
            ("bitcoin", dec!(97500), dec!(-4.0)),
            ("ethereum", dec!(3450), dec!(2.5)),
            ("solana", dec!(195), dec!(-9.0)),
            ("cardano", dec!(0.95), dec!(1.2)),
            ("polkadot", dec!(7.20), dec!(-2.0)),
        ];

        tokens
            .into_iter()
            .fold(Self::new(), |source, (token, now, trend)| {
                source.with_prices(token, synthetic_series(now, trend, 168))
            })
    }

    /// Number of fetches made for `token`
    pub async fn calls(&self, token: &str) -> usize {
        self.calls.lock().await.get(token).copied().unwrap_or(0)
    }
}

/// Linear drift from `now / (1 + trend%)` to `now` with a small saw-tooth wiggle
fn synthetic_series(now: Decimal, trend_percent: Decimal, points: u32) -> Vec<Decimal> {
    let start = now / (Decimal::ONE + trend_percent / dec!(100));
    let steps = Decimal::from(points.saturating_sub(1).max(1));

    (0..points)
        .map(|i| {
            let progress = Decimal::from(i) / steps;
            let wiggle = Decimal::ONE + dec!(0.002) * Decimal::from(i % 5) - dec!(0.004);
            let price = if i + 1 == points {
                now
            } else {
                (start + (now - start) * progress) * wiggle
            };
            price.round_dp(6)
        })
        .collect()
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_history(&self, token: &str, lookback_days: u32) -> Result<PriceSeries> {
        *self.calls.lock().await.entry(token.to_string()).or_insert(0) += 1;

        if lookback_days == 0 {
            return Err(AdvisorError::Config("lookback_days must be positive".into()));
        }
        if self.failing.contains(token) {
            return Err(AdvisorError::RetriesExhausted {
                token: token.to_string(),
                attempts: 10,
                last: Box::new(AdvisorError::RateLimited {
                    token: token.to_string(),
                }),
            });
        }

        let prices = self
            .series
            .get(token)
            .ok_or_else(|| AdvisorError::HttpStatus {
                token: token.to_string(),
                status: 404,
            })?;

        let end = Utc::now();
        let len = i64::try_from(prices.len()).unwrap_or(i64::MAX);
        let points = prices
            .iter()
            .zip(0_i64..)
            .map(|(&price, i)| PricePoint::new(end - Duration::hours(len - 1 - i), price))
            .collect();

        PriceSeries::new(token, points)
    }

    fn name(&self) -> &str {
        "MockPriceSource"
    }
}
