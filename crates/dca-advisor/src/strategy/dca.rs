//! Daily Dollar-Cost Averaging Strategy
//!
//! Spends a fixed daily budget on the single most attractive token that is
//! still below its target allocation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{AllocationTargets, ScoreWeights};
use crate::error::{AdvisorError, Result};
use crate::model::{
    Opportunity, Outcome, PortfolioAnalysis, PriceSummaries, Reasoning, Recommendation,
};

/// Daily DCA buy selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DCAStrategy {
    /// Amount to spend per day (USD)
    pub daily_budget: Decimal,

    pub weights: ScoreWeights,
}

impl DCAStrategy {
    pub fn new(daily_budget: Decimal) -> Self {
        Self {
            daily_budget,
            weights: ScoreWeights::default(),
        }
    }

    pub const fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Score every target token that has both a price and a holding row.
    ///
    /// Returned in token order.
    pub fn opportunities(
        &self,
        targets: &AllocationTargets,
        analysis: &PortfolioAnalysis,
        summary: &PriceSummaries,
    ) -> Vec<Opportunity> {
        targets
            .iter()
            .filter_map(|(token, weight)| {
                let Some(price) = summary.get(token) else {
                    warn!(token, "No price summary; token not scored");
                    return None;
                };
                let Some(holding) = analysis.holding(token) else {
                    warn!(token, "Not in portfolio analysis; token not scored");
                    return None;
                };
                let Some(opportunity) = self.weights.opportunity(token, weight, price, holding)
                else {
                    warn!(token, "Score does not fit in a decimal; token not scored");
                    return None;
                };
                debug!(
                    token,
                    score = %opportunity.score,
                    allocation_difference = %opportunity.allocation_difference,
                    "Scored opportunity"
                );
                Some(opportunity)
            })
            .collect()
    }

    /// Pick the under-allocated token with the lowest score.
    ///
    /// Equal scores resolve to the first token in lexicographic order.
    pub fn select(opportunities: &[Opportunity]) -> Option<&Opportunity> {
        opportunities
            .iter()
            .filter(|o| o.is_under_allocated())
            .min_by(|a, b| a.score.cmp(&b.score))
    }

    /// Produce today's buy, or `NoTrade` if nothing is under its target.
    ///
    /// An empty price summary or portfolio is an error, so callers can tell
    /// "could not compute" apart from "nothing to buy".
    pub fn recommend(
        &self,
        targets: &AllocationTargets,
        analysis: PortfolioAnalysis,
        summary: &PriceSummaries,
    ) -> Result<Outcome> {
        if summary.is_empty() {
            return Err(AdvisorError::AnalysisUnavailable("no price data available".into()));
        }
        if analysis.holdings.is_empty() {
            return Err(AdvisorError::AnalysisUnavailable(
                "portfolio has no valued holdings".into(),
            ));
        }

        let opportunities = self.opportunities(targets, &analysis, summary);

        let Some(best) = Self::select(&opportunities) else {
            info!("No token is under its target allocation");
            return Ok(Outcome::NoTrade { portfolio: analysis });
        };

        let quantity = self
            .daily_budget
            .checked_div(best.price)
            .unwrap_or_default();

        info!(
            token = %best.token,
            amount_usd = %self.daily_budget,
            score = %best.score,
            allocation_difference = %best.allocation_difference,
            "Selected buy candidate"
        );

        Ok(Outcome::Buy(Recommendation {
            token: best.token.clone(),
            amount_usd: self.daily_budget,
            quantity,
            reasoning: Reasoning::from(best),
            portfolio: analysis,
        }))
    }
}
