//! DCA Advisor
//!
//! Ties the run together: price cache -> summary -> portfolio analysis ->
//! daily buy selection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::exchange::PriceSource;
use crate::model::{Outcome, PortfolioAnalysis, PriceSummaries};
use crate::strategy::{AllocationTargets, DCAStrategy};
use crate::svckit::{PriceCache, analyze, summarize};

/// Everything one run produced, for display or JSON output
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdvisorRun {
    pub summary: PriceSummaries,
    pub targets: AllocationTargets,
    pub outcome: Outcome,

    /// Tokens that had no price data this run
    pub unavailable: Vec<String>,
}

/// One advisor per process run; owns the run-scoped price cache
pub struct DCAAdvisor {
    config: AdvisorConfig,
    cache: PriceCache,
    strategy: DCAStrategy,

    /// Summary of the run, computed on first request
    summary: Option<PriceSummaries>,

    /// Configured tokens left out of `summary`
    unavailable: Vec<String>,
}

impl DCAAdvisor {
    pub fn new(config: AdvisorConfig, source: Arc<dyn PriceSource>) -> Self {
        let cache = PriceCache::new(source, config.provider.lookback_days);
        let strategy = DCAStrategy::new(config.settings.daily_budget).with_weights(config.strategy);

        info!(
            daily_budget = %config.settings.daily_budget,
            tokens = config.allocations.len(),
            "Initialized DCA advisor"
        );
        for (token, weight) in config.allocations.iter() {
            info!(token, target = %weight, "Target allocation");
        }

        Self {
            config,
            cache,
            strategy,
            summary: None,
            unavailable: Vec::new(),
        }
    }

    pub const fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Summary for every configured token with usable price data.
    ///
    /// Fetched and computed on first use; later calls return the same summary.
    pub async fn price_summary(&mut self) -> PriceSummaries {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        let tokens = self.config.tokens();
        self.cache.warm(tokens.iter().map(String::as_str)).await;

        let mut summary = PriceSummaries::new();
        let mut unavailable = Vec::new();
        for token in tokens {
            let Some(series) = self.cache.get(&token) else {
                unavailable.push(token);
                continue;
            };
            match summarize(series) {
                Ok(s) => {
                    summary.insert(token, s);
                }
                Err(e) => {
                    warn!(token, error = %e, "Could not summarize price history");
                    unavailable.push(token);
                }
            }
        }

        self.unavailable = unavailable;
        self.summary = Some(summary.clone());
        summary
    }

    pub async fn analyze_portfolio(&mut self) -> Result<PortfolioAnalysis> {
        let summary = self.price_summary().await;
        analyze(&self.config.held_amounts(), &summary)
    }

    /// Run the full recommendation.
    ///
    /// `Err` means the recommendation could not be computed; "nothing to buy"
    /// is `Ok` with `Outcome::NoTrade`.
    pub async fn recommend(&mut self) -> Result<AdvisorRun> {
        info!("Starting new trade analysis");

        let analysis = self.analyze_portfolio().await?;
        let summary = self.price_summary().await;
        let outcome = self
            .strategy
            .recommend(&self.config.allocations, analysis, &summary)?;

        Ok(AdvisorRun {
            summary,
            targets: self.config.allocations.clone(),
            outcome,
            unavailable: self.unavailable.clone(),
        })
    }

    /// Configured tokens without a summary; empty until the summary is computed
    pub fn unavailable_tokens(&self) -> &[String] {
        &self.unavailable
    }
}
