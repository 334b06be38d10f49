//! End-to-end runs of the advisor against the in-memory price source.

use std::sync::Arc;

use dca_advisor::{AdvisorConfig, AdvisorError, DCAAdvisor, MockPriceSource, Outcome};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn flat(price: Decimal, points: usize) -> Vec<Decimal> {
    vec![price; points]
}

fn config(allocations: &str, holdings: &str) -> AdvisorConfig {
    let raw = format!(
        "[allocations]\n{allocations}\n\n\
         [long_term_portfolio]\n{holdings}\n\n\
         [settings]\ndaily_budget = 25\nmin_trade_size = 10\n"
    );
    AdvisorConfig::from_toml_str(&raw).unwrap()
}

#[tokio::test]
async fn test_failed_token_is_excluded_and_run_completes() {
    let source = Arc::new(
        MockPriceSource::new()
            .with_prices("a", flat(dec!(1), 48))
            .with_prices("b", flat(dec!(1), 48))
            .with_failure("y"),
    );
    let mut advisor = DCAAdvisor::new(
        config("a = 0.4\nb = 0.4\ny = 0.2", "a = 70\nb = 30\ny = 10"),
        source.clone(),
    );

    let run = advisor.recommend().await.unwrap();

    assert_eq!(run.unavailable, vec!["y"]);
    assert!(!run.summary.contains_key("y"));
    assert!(run.outcome.portfolio().holding("y").is_none());
    assert_eq!(run.outcome.portfolio().total_value, dec!(100));

    let rec = run.outcome.recommendation().unwrap();
    assert_eq!(rec.token, "b");
    assert_eq!(rec.amount_usd, dec!(25));
    assert_eq!(rec.reasoning.allocation_difference, dec!(10));
}

#[tokio::test]
async fn test_each_token_fetched_once_per_run() {
    let source = Arc::new(
        MockPriceSource::new()
            .with_prices("a", flat(dec!(2), 48))
            .with_prices("b", flat(dec!(3), 48))
            .with_failure("y"),
    );
    let mut advisor = DCAAdvisor::new(
        config("a = 0.4\nb = 0.4\ny = 0.2", "a = 1\nb = 1"),
        source.clone(),
    );

    advisor.recommend().await.unwrap();
    advisor.price_summary().await;
    advisor.analyze_portfolio().await.unwrap();

    assert_eq!(source.calls("a").await, 1);
    assert_eq!(source.calls("b").await, 1);
    assert_eq!(source.calls("y").await, 1);
}

#[tokio::test]
async fn test_balanced_portfolio_is_no_trade() {
    let source = Arc::new(
        MockPriceSource::new()
            .with_prices("a", flat(dec!(10), 30))
            .with_prices("b", flat(dec!(5), 30)),
    );
    let mut advisor = DCAAdvisor::new(config("a = 0.5\nb = 0.5", "a = 5\nb = 10"), source);

    let run = advisor.recommend().await.unwrap();

    assert!(matches!(run.outcome, Outcome::NoTrade { .. }));
    assert!(run.outcome.recommendation().is_none());
}

#[tokio::test]
async fn test_no_price_data_is_an_error_not_no_trade() {
    let source = Arc::new(MockPriceSource::new().with_failure("a").with_failure("b"));
    let mut advisor = DCAAdvisor::new(config("a = 0.5\nb = 0.5", "a = 1\nb = 1"), source);

    let result = advisor.recommend().await;

    assert!(matches!(result, Err(AdvisorError::AnalysisUnavailable(_))));
}

#[tokio::test]
async fn test_short_history_token_is_excluded() {
    let source = Arc::new(
        MockPriceSource::new()
            .with_prices("a", flat(dec!(1), 48))
            .with_prices("b", flat(dec!(1), 10)),
    );
    let mut advisor = DCAAdvisor::new(config("a = 0.5\nb = 0.5", "a = 1\nb = 1"), source);

    let summary = advisor.price_summary().await;

    assert!(summary.contains_key("a"));
    assert!(!summary.contains_key("b"));
    assert_eq!(advisor.unavailable_tokens(), ["b"]);
}

#[tokio::test]
async fn test_unavailable_tokens_recorded_once_summary_is_computed() {
    let source = Arc::new(
        MockPriceSource::new()
            .with_prices("a", flat(dec!(1), 48))
            .with_failure("y"),
    );
    let mut advisor = DCAAdvisor::new(config("a = 0.5\ny = 0.5", "a = 1"), source);

    assert!(advisor.unavailable_tokens().is_empty());

    let first = advisor.price_summary().await;
    let second = advisor.price_summary().await;

    assert_eq!(first, second);
    assert_eq!(advisor.unavailable_tokens(), ["y"]);
}

#[tokio::test]
async fn test_change_too_large_for_decimal_excludes_token() {
    let mut tiny = flat(dec!(1), 30);
    tiny[0] = Decimal::new(1, 27);

    let source = Arc::new(
        MockPriceSource::new()
            .with_prices("a", flat(dec!(1), 30))
            .with_prices("b", flat(dec!(1), 30))
            .with_prices("tiny", tiny),
    );
    let mut advisor = DCAAdvisor::new(
        config("a = 0.4\nb = 0.4\ntiny = 0.2", "a = 70\nb = 30\ntiny = 5"),
        source,
    );

    let run = advisor.recommend().await.unwrap();

    assert_eq!(run.unavailable, vec!["tiny"]);
    assert!(!run.summary.contains_key("tiny"));
    assert_eq!(run.outcome.recommendation().unwrap().token, "b");
}

#[tokio::test]
async fn test_momentum_decides_between_under_allocated_tokens() {
    // b fell 10% in the last hour, c rose 10%; both are under target
    let mut falling = flat(dec!(100), 48);
    falling[47] = dec!(90);
    let mut rising = flat(dec!(100), 48);
    rising[47] = dec!(110);

    let source = Arc::new(
        MockPriceSource::new()
            .with_prices("a", flat(dec!(1), 48))
            .with_prices("b", falling)
            .with_prices("c", rising),
    );
    // Values: a 60, b 18, c 22 against targets 40/30/30
    let mut advisor = DCAAdvisor::new(
        config("a = 0.4\nb = 0.3\nc = 0.3", "a = 60\nb = 0.2\nc = 0.2"),
        source,
    );

    let run = advisor.recommend().await.unwrap();
    let rec = run.outcome.recommendation().unwrap();

    assert_eq!(rec.token, "b");
    assert_eq!(rec.reasoning.change_7d, dec!(-10));
    assert_eq!(rec.reasoning.change_24h, dec!(-10));
}

#[tokio::test]
async fn test_run_serializes_to_json() {
    let source = Arc::new(MockPriceSource::demo());
    let mut advisor = DCAAdvisor::new(
        config(
            "bitcoin = 0.5\nethereum = 0.3\nsolana = 0.2",
            "bitcoin = 0.01\nethereum = 0.5\nsolana = 1",
        ),
        source,
    );

    let run = advisor.recommend().await.unwrap();
    let json = serde_json::to_value(&run).unwrap();

    assert!(json["summary"]["bitcoin"].is_object());
    assert!(json["outcome"]["action"].is_string());
}
