//! Advisor Configuration
//!
//! Loaded from a TOML file; see `config.example.toml` at the repository root.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AdvisorError, Result};
use crate::exchange::{DEFAULT_BASE_URL, RetryPolicy};
use crate::strategy::{AllocationTargets, ScoreWeights};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Budget settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// USD to spend per day
    pub daily_budget: Decimal,

    /// Smallest order an execution layer would place. Not used by scoring.
    #[serde(default)]
    pub min_trade_size: Decimal,
}

/// Market data provider settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,

    /// Optional CoinGecko demo API key
    pub api_key: Option<String>,

    /// History window in days
    pub lookback_days: u32,

    /// Maximum attempts per token
    pub max_retries: u32,

    /// Cap for a single backoff wait
    pub max_wait_secs: u64,

    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            lookback_days: 7,
            max_retries: 10,
            max_wait_secs: 10,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl ProviderSettings {
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.max_wait_secs))
    }

    /// Apply `COINGECKO_API_KEY` / `COINGECKO_BASE_URL` from the environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("COINGECKO_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("COINGECKO_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
    }
}

/// Full advisor configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Target weight per token (0..1)
    pub allocations: AllocationTargets,

    #[serde(default)]
    pub trading_portfolio: BTreeMap<String, Decimal>,

    #[serde(default)]
    pub long_term_portfolio: BTreeMap<String, Decimal>,

    pub settings: Settings,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub strategy: ScoreWeights,
}

impl AdvisorConfig {
    /// Load, apply environment overrides and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AdvisorError::Config(format!(
                "configuration file not found. Please copy config.example.toml to {} \
                 and update values.",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw)?;
        config.provider.apply_env();
        Ok(config)
    }

    /// Parse and validate without touching the environment
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.allocations.validate()?;

        for (name, book) in [
            ("trading_portfolio", &self.trading_portfolio),
            ("long_term_portfolio", &self.long_term_portfolio),
        ] {
            if let Some((token, amount)) = book.iter().find(|(_, a)| a.is_sign_negative()) {
                return Err(AdvisorError::Config(format!(
                    "{name}.{token} must not be negative (got {amount})"
                )));
            }
            for token in book.keys().filter(|t| !self.allocations.contains(t)) {
                warn!(token, portfolio = name, "Holding has no target allocation and is ignored");
            }
        }

        if self.settings.daily_budget <= Decimal::ZERO {
            return Err(AdvisorError::Config("settings.daily_budget must be positive".into()));
        }
        if self.settings.min_trade_size.is_sign_negative() {
            return Err(AdvisorError::Config("settings.min_trade_size must not be negative".into()));
        }
        if self.settings.daily_budget < self.settings.min_trade_size {
            warn!(
                daily_budget = %self.settings.daily_budget,
                min_trade_size = %self.settings.min_trade_size,
                "Daily budget is below the minimum trade size"
            );
        }

        if self.provider.lookback_days == 0 {
            return Err(AdvisorError::Config("provider.lookback_days must be positive".into()));
        }
        if self.provider.max_retries == 0 {
            return Err(AdvisorError::Config("provider.max_retries must be positive".into()));
        }

        Ok(())
    }

    /// Total held per target token: trading + long-term, missing entries count as zero
    pub fn held_amounts(&self) -> BTreeMap<String, Decimal> {
        self.allocations
            .tokens()
            .map(|token| {
                let trading = self.trading_portfolio.get(token).copied().unwrap_or_default();
                let long_term = self.long_term_portfolio.get(token).copied().unwrap_or_default();
                (token.to_string(), trading + long_term)
            })
            .collect()
    }

    /// Tokens to fetch, in target order
    pub fn tokens(&self) -> Vec<String> {
        self.allocations.tokens().map(str::to_string).collect()
    }
}
