//! Service Kit
//!
//! Run-scoped services behind the advisor: price cache, summaries, portfolio
//! analysis and the console report.

mod price_cache;
pub mod price_summary;
pub mod portfolio_analyzer;
pub mod report;

pub use portfolio_analyzer::analyze;
pub use price_cache::PriceCache;
pub use price_summary::{percent_change, summarize};
pub use report::{render_outcome, render_overview};
