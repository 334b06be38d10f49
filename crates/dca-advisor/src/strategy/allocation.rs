//! Allocation Targets
//!
//! Target weight per token. Weights are expected to sum to 1 but that is
//! only warned about, never enforced.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AdvisorError, Result};

/// Tolerance for the "weights sum to 1" check
const SUM_TOLERANCE: Decimal = dec!(0.001);

/// Target weights keyed by token, iterated in token order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationTargets(BTreeMap<String, Decimal>);

impl AllocationTargets {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        Self(targets.into_iter().map(|(t, w)| (t.into(), w)).collect())
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(AdvisorError::InvalidAllocation(
                "at least one target allocation is required".into(),
            ));
        }

        if let Some((token, weight)) = self
            .0
            .iter()
            .find(|(_, w)| **w < Decimal::ZERO || **w > Decimal::ONE)
        {
            return Err(AdvisorError::InvalidAllocation(format!(
                "{token} target {weight} is outside 0..=1"
            )));
        }

        let total = self.total();
        if (total - Decimal::ONE).abs() > SUM_TOLERANCE {
            warn!(%total, "Target allocations do not sum to 1");
        }

        Ok(())
    }

    /// Fractional target weight
    pub fn weight(&self, token: &str) -> Option<Decimal> {
        self.0.get(token).copied()
    }

    /// Target weight expressed in percent
    pub fn target_percent(&self, token: &str) -> Option<Decimal> {
        self.weight(token).map(|w| w * dec!(100))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.0.values().sum()
    }
}
