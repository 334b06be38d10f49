//! Console Report
//!
//! Market overview table and recommendation summary. The Diff column is
//! green under target and red over it; color follows `colored::control`.

use colored::Colorize;
use rust_decimal::Decimal;

use crate::model::{Outcome, PortfolioAnalysis, PriceSummaries};
use crate::strategy::AllocationTargets;

const HEADERS: [&str; 9] = [
    "Token",
    "Price",
    "24h Change",
    "7d Change",
    "Holdings",
    "Value USD",
    "Current %",
    "Target %",
    "Diff",
];

/// Market and portfolio overview.
///
/// One row per priced token; portfolio columns show `-` for tokens missing
/// from the analysis. Diff is current% - target%.
pub fn render_overview(
    summary: &PriceSummaries,
    portfolio: Option<&PortfolioAnalysis>,
    targets: &AllocationTargets,
) -> String {
    let rows: Vec<Row> = summary
        .iter()
        .map(|(token, prices)| {
            let holding = portfolio.and_then(|p| p.holding(token));
            let target = targets.target_percent(token);
            let drift = holding.zip(target).map(|(h, t)| h.percentage - t);
            let (amount, value, current, target, diff) = match (holding, target, drift) {
                (Some(h), Some(t), Some(d)) => (
                    format!("{:.4}", h.amount),
                    format!("${:.2}", h.value_usd),
                    format!("{:.1}%", h.percentage),
                    format!("{t:.1}%"),
                    format!("{d:+.1}%"),
                ),
                _ => dash5(),
            };
            Row {
                cells: [
                    token.to_uppercase(),
                    format!("${:.2}", prices.current),
                    format!("{:+.2}%", prices.change_24h),
                    format!("{:+.2}%", prices.change_7d),
                    amount,
                    value,
                    current,
                    target,
                    diff,
                ],
                drift,
            }
        })
        .collect();

    let mut out = String::from("Portfolio and Market Overview:\n");
    if let Some(p) = portfolio {
        out.push_str(&format!("Total Portfolio Value: ${:.2}\n", p.total_value));
    }
    out.push_str(&grid(&rows));
    out
}

fn dash5() -> (String, String, String, String, String) {
    let d = || "-".to_string();
    (d(), d(), d(), d(), d())
}

struct Row {
    cells: [String; 9],

    /// current% - target%, drives the Diff color
    drift: Option<Decimal>,
}

fn grid(rows: &[Row]) -> String {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(&row.cells) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let rule = {
        let mut s = String::from("+");
        for w in widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s.push('\n');
        s
    };
    let mut out = rule.clone();
    out.push_str(&line(HEADERS.iter().copied(), &widths, None));
    out.push_str(&rule.replace('-', "="));
    for row in rows {
        out.push_str(&line(row.cells.iter().map(String::as_str), &widths, row.drift));
        out.push_str(&rule);
    }
    out
}

/// Pads every cell; the last one is colored by `drift` after padding so
/// escape codes do not skew the column width
fn line<'a>(
    cells: impl Iterator<Item = &'a str>,
    widths: &[usize; 9],
    drift: Option<Decimal>,
) -> String {
    let mut s = String::from("|");
    for (i, (cell, &w)) in cells.zip(widths).enumerate() {
        let padded = format!("{cell:<w$}");
        let padded = if i == widths.len() - 1 {
            paint(padded, drift)
        } else {
            padded
        };
        s.push_str(&format!(" {padded} |"));
    }
    s.push('\n');
    s
}

fn paint(cell: String, drift: Option<Decimal>) -> String {
    match drift {
        Some(d) if d < Decimal::ZERO => cell.green().to_string(),
        Some(d) if d > Decimal::ZERO => cell.red().to_string(),
        _ => cell,
    }
}

/// Final recommendation block, or the no-trade message
pub fn render_outcome(outcome: &Outcome) -> String {
    let Outcome::Buy(rec) = outcome else {
        return "No trade recommended at this time\n".to_string();
    };
    let r = &rec.reasoning;

    let mut s = String::from("=== TRADE RECOMMENDATION ===\n");
    s.push_str(&format!("Buy {}\n", rec.token.to_uppercase()));
    s.push_str(&format!("Amount: ${:.2}\n", rec.amount_usd));
    s.push_str(&format!("Quantity: {}\n", rec.quantity.round_dp(8).normalize()));
    s.push_str(&format!("Current price: ${:.4}\n", r.price));
    s.push_str(&format!("24h change: {:.1}%\n", r.change_24h));
    s.push_str(&format!("7d change: {:.1}%\n", r.change_7d));
    s.push_str(&format!(
        "Allocation: {:.1}% of {:.1}% target ({:+.1}% gap)\n",
        r.current_percent, r.target_percent, r.allocation_difference
    ));
    s.push_str(&format!("Score: {:.2}\n", r.score));
    s
}
