//! Price Sources
//!
//! Abstractions and implementations for market data providers.

mod coingecko;
mod mock;
pub mod retry;

pub use coingecko::{CoinGeckoClient, DEFAULT_BASE_URL};
pub use mock::MockPriceSource;
pub use retry::{Retried, RetryPolicy, RetryState};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::PriceSeries;

/// Price history provider (Strategy pattern)
///
/// Implement this for each market data source.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the price series of `token` over the last `lookback_days` days.
    ///
    /// Transient failures are retried inside the source; an `Err` here is
    /// final for this token.
    async fn fetch_history(&self, token: &str, lookback_days: u32) -> Result<PriceSeries>;

    /// Provider name
    fn name(&self) -> &str;
}
