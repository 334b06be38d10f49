//! Opportunity Scoring
//!
//! Lower score = better buy. Negative momentum and an under-allocated
//! position both pull the score down ("buy the dip toward target").

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{Holding, Opportunity, PriceSummary};

/// Weights of the composite score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub momentum_7d: Decimal,
    pub momentum_24h: Decimal,
    pub allocation_gap: Decimal,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            momentum_7d: dec!(0.50),
            momentum_24h: dec!(0.25),
            allocation_gap: dec!(0.25),
        }
    }
}

impl ScoreWeights {
    /// Weighted sum, `None` if it does not fit in a `Decimal`
    pub fn score(
        &self,
        change_7d: Decimal,
        change_24h: Decimal,
        allocation_gap: Decimal,
    ) -> Option<Decimal> {
        self.momentum_7d
            .checked_mul(change_7d)?
            .checked_add(self.momentum_24h.checked_mul(change_24h)?)?
            .checked_add(self.allocation_gap.checked_mul(allocation_gap)?)
    }

    /// Build the opportunity record for one token
    pub fn opportunity(
        &self,
        token: &str,
        target_weight: Decimal,
        summary: &PriceSummary,
        holding: &Holding,
    ) -> Option<Opportunity> {
        let target_percent = target_weight * dec!(100);
        let allocation_difference = target_percent - holding.percentage;
        let score = self.score(summary.change_7d, summary.change_24h, allocation_difference)?;

        Some(Opportunity {
            token: token.to_string(),
            price: summary.current,
            change_24h: summary.change_24h,
            change_7d: summary.change_7d,
            target_percent,
            current_percent: holding.percentage,
            allocation_difference,
            score,
        })
    }
}
