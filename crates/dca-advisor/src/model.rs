//! Domain Models
//!
//! Core data types for the daily DCA advisor.
//! Uses `rust_decimal` for all prices, values and percentages - never use f64 for money!

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

/// A single observation in a price history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,

    /// Price in USD
    pub price: Decimal,
}

impl PricePoint {
    pub const fn new(timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self { timestamp, price }
    }
}

/// Price history for one token over the lookback window.
///
/// Always non-empty and sorted ascending by timestamp: index 0 is the
/// oldest point, the last index is the most recent one. Deserialization goes
/// through `PriceSeries::new`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    token: String,
    points: Vec<PricePoint>,
}

#[derive(Deserialize)]
struct RawPriceSeries {
    token: String,
    points: Vec<PricePoint>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = AdvisorError;

    fn try_from(raw: RawPriceSeries) -> Result<Self> {
        Self::new(raw.token, raw.points)
    }
}

impl PriceSeries {
    pub fn new(token: impl Into<String>, mut points: Vec<PricePoint>) -> Result<Self> {
        let token = token.into();
        if points.is_empty() {
            return Err(AdvisorError::EmptyHistory(token));
        }
        points.sort_by_key(|p| p.timestamp);
        Ok(Self { token, points })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Oldest point in the window
    pub fn oldest(&self) -> &PricePoint {
        &self.points[0]
    }

    /// Most recent point in the window
    pub fn latest(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    /// Point used as the reference for a time frame, if the series is long enough
    pub fn reference(&self, frame: TimeFrame) -> Option<&PricePoint> {
        frame
            .reference_index(self.points.len())
            .and_then(|idx| self.points.get(idx))
    }
}

/// Time windows reported by the price summary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFrame {
    Current,
    Hours24,
    Days7,
}

impl TimeFrame {
    /// Number of points back from the end of an hourly series that marks 24 hours ago
    pub const HOURS_24_OFFSET: usize = 24;

    /// Index of the reference point for this window in a series of `len` points.
    ///
    /// `Hours24` uses a fixed offset of 24 points and `Days7` is the oldest
    /// point of the fetched window, not a calendar-exact "7 days ago".
    pub const fn reference_index(self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        match self {
            Self::Current => Some(len - 1),
            Self::Hours24 => len.checked_sub(Self::HOURS_24_OFFSET),
            Self::Days7 => Some(0),
        }
    }
}

/// Current price and short-term performance for one token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Latest price in USD
    pub current: Decimal,

    /// Percentage change over the last 24 points
    pub change_24h: Decimal,

    /// Percentage change since the oldest point of the window
    pub change_7d: Decimal,
}

impl PriceSummary {
    pub const fn get(&self, frame: TimeFrame) -> Decimal {
        match frame {
            TimeFrame::Current => self.current,
            TimeFrame::Hours24 => self.change_24h,
            TimeFrame::Days7 => self.change_7d,
        }
    }
}

/// Price summaries keyed by token, in token order
pub type PriceSummaries = BTreeMap<String, PriceSummary>;

/// A valued holding in the portfolio
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Token identifier
    pub token: String,

    /// Quantity held across the trading and long-term portfolios
    pub amount: Decimal,

    /// Current price in USD
    pub price: Decimal,

    /// Current value (amount * price)
    pub value_usd: Decimal,

    /// Share of the total portfolio value, in percent
    pub percentage: Decimal,
}

/// Snapshot of the portfolio at current prices
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub total_value: Decimal,

    /// Holdings ordered by descending USD value
    pub holdings: Vec<Holding>,
}

impl PortfolioAnalysis {
    pub fn holding(&self, token: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.token == token)
    }
}

/// Scored buy candidate, transient within one recommendation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub token: String,
    pub price: Decimal,
    pub change_24h: Decimal,
    pub change_7d: Decimal,

    /// Target weight expressed in percent
    pub target_percent: Decimal,

    /// Current share of the portfolio in percent
    pub current_percent: Decimal,

    /// target% - current%; positive means under-allocated
    pub allocation_difference: Decimal,

    /// Composite score, lower is a better buy
    pub score: Decimal,
}

impl Opportunity {
    pub fn is_under_allocated(&self) -> bool {
        self.allocation_difference > Decimal::ZERO
    }
}

/// Why a token was picked
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reasoning {
    pub price: Decimal,
    pub change_24h: Decimal,
    pub change_7d: Decimal,
    pub score: Decimal,
    pub allocation_difference: Decimal,
    pub target_percent: Decimal,
    pub current_percent: Decimal,
}

impl From<&Opportunity> for Reasoning {
    fn from(o: &Opportunity) -> Self {
        Self {
            price: o.price,
            change_24h: o.change_24h,
            change_7d: o.change_7d,
            score: o.score,
            allocation_difference: o.allocation_difference,
            target_percent: o.target_percent,
            current_percent: o.current_percent,
        }
    }
}

/// The daily buy recommendation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub token: String,

    /// Suggested spend (the daily budget)
    pub amount_usd: Decimal,

    /// Quantity the budget buys at the current price
    pub quantity: Decimal,

    pub reasoning: Reasoning,

    /// Portfolio the decision was made against
    pub portfolio: PortfolioAnalysis,
}

/// Result of a successful recommendation computation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Outcome {
    Buy(Recommendation),

    /// No token is under its target allocation
    NoTrade { portfolio: PortfolioAnalysis },
}

impl Outcome {
    pub const fn portfolio(&self) -> &PortfolioAnalysis {
        match self {
            Self::Buy(rec) => &rec.portfolio,
            Self::NoTrade { portfolio } => portfolio,
        }
    }

    pub const fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Self::Buy(rec) => Some(rec),
            Self::NoTrade { .. } => None,
        }
    }
}
