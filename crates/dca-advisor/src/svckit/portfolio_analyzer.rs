//! Portfolio Analyzer
//!
//! Values holdings at current prices and computes each one's share of the
//! portfolio. Two passes: values and the total first, percentages second.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::error::{AdvisorError, Result};
use crate::model::{Holding, PortfolioAnalysis, PriceSummaries};

/// Value `held` (token -> amount) against `summary`.
///
/// Tokens without a price, or whose value overflows, are skipped. Fails
/// instead of dividing by zero when the summary is empty or nothing in the
/// portfolio has value.
pub fn analyze(
    held: &BTreeMap<String, Decimal>,
    summary: &PriceSummaries,
) -> Result<PortfolioAnalysis> {
    if summary.is_empty() {
        return Err(AdvisorError::AnalysisUnavailable("price fetch failed for every token".into()));
    }

    // Pass 1: values
    let mut holdings = Vec::with_capacity(held.len());
    for (token, &amount) in held {
        let Some(prices) = summary.get(token) else {
            warn!(token, "No current price; holding left out of the analysis");
            continue;
        };
        let Some(value_usd) = amount.checked_mul(prices.current) else {
            warn!(token, %amount, price = %prices.current, "Holding value overflows; left out");
            continue;
        };
        holdings.push(Holding {
            token: token.clone(),
            amount,
            price: prices.current,
            value_usd,
            percentage: Decimal::ZERO,
        });
    }

    let total_value = holdings
        .iter()
        .try_fold(Decimal::ZERO, |acc, h| acc.checked_add(h.value_usd))
        .ok_or_else(|| {
            AdvisorError::AnalysisUnavailable("total portfolio value overflows".into())
        })?;
    if total_value <= Decimal::ZERO {
        return Err(AdvisorError::AnalysisUnavailable(
            "total portfolio value is zero".into(),
        ));
    }

    // Pass 2: percentages, only valid once the total is known
    for holding in &mut holdings {
        holding.percentage = holding.value_usd / total_value * dec!(100);
    }

    // Stable: equal values keep token order
    holdings.sort_by(|a, b| b.value_usd.cmp(&a.value_usd));

    info!(
        total_value = %total_value.round_dp(2),
        holdings = holdings.len(),
        "Analyzed portfolio"
    );

    Ok(PortfolioAnalysis {
        total_value,
        holdings,
    })
}
