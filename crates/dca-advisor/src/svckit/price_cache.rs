//! Run-scoped Price Cache
//!
//! Each token's history is fetched at most once per run. Failures are
//! remembered too, so a token that could not be fetched stays absent for the
//! rest of the run instead of being retried. No expiry, no persistence.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::exchange::PriceSource;
use crate::model::PriceSeries;

pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    lookback_days: u32,

    /// `None` marks a token whose fetch failed this run
    entries: HashMap<String, Option<PriceSeries>>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>, lookback_days: u32) -> Self {
        Self {
            source,
            lookback_days,
            entries: HashMap::new(),
        }
    }

    /// Cached series for `token`, fetching it on first use
    pub async fn get_or_fetch(&mut self, token: &str) -> Option<&PriceSeries> {
        if !self.entries.contains_key(token) {
            let fetched = match self.source.fetch_history(token, self.lookback_days).await {
                Ok(series) => Some(series),
                Err(e) => {
                    warn!(
                        token,
                        source = self.source.name(),
                        error = %e,
                        "No price data; token excluded from this run"
                    );
                    None
                }
            };
            self.entries.insert(token.to_string(), fetched);
        } else {
            debug!(token, "Price history cache hit");
        }

        self.entries.get(token).and_then(Option::as_ref)
    }

    /// Fetch every token not seen yet, one after the other
    pub async fn warm<'a>(&mut self, tokens: impl IntoIterator<Item = &'a str>) {
        for token in tokens {
            self.get_or_fetch(token).await;
        }
    }

    /// Cached series without fetching
    pub fn get(&self, token: &str) -> Option<&PriceSeries> {
        self.entries.get(token).and_then(Option::as_ref)
    }
}
