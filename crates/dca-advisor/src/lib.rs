//! # dca-advisor
//!
//! Daily dollar-cost-averaging buy advisor for a multi-token crypto portfolio.
//!
//! ## How a run works
//!
//! 1. Fetch 7 days of hourly prices per token (once per run, with retry and
//!    exponential backoff on rate limits)
//! 2. Summarize: current price, 24h and 7d change
//! 3. Value the portfolio and compare each token's share with its target
//! 4. Score the under-allocated tokens and buy the lowest score with the
//!    daily budget, or do nothing if every token is at or above target
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  score = 0.50 × 7d change + 0.25 × 24h change + 0.25 × gap   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  BTC  target 50%  now 62%  gap -12  → not eligible           │
//! │  ETH  target 30%  now 24%  gap  +6  score  -1.9              │
//! │  SOL  target 20%  now 14%  gap  +6  score  -4.3  ◀ BUY $25   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod advisor;
pub mod config;
pub mod error;
pub mod exchange;
pub mod model;
pub mod strategy;
pub mod svckit;

pub use advisor::{AdvisorRun, DCAAdvisor};
pub use config::AdvisorConfig;
pub use error::{AdvisorError, Result};
pub use exchange::{CoinGeckoClient, MockPriceSource, PriceSource};
pub use model::{
    Holding, Opportunity, Outcome, PortfolioAnalysis, PricePoint, PriceSeries, PriceSummaries,
    PriceSummary, Recommendation, TimeFrame,
};
pub use strategy::{AllocationTargets, DCAStrategy, ScoreWeights};
