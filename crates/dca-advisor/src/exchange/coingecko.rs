//! CoinGecko Client
//!
//! Fetches hourly market charts from the public CoinGecko API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use tracing::{debug, info};

use super::PriceSource;
use super::retry::RetryPolicy;
use crate::config::ProviderSettings;
use crate::error::{AdvisorError, Result};
use crate::model::{PricePoint, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// `/coins/{id}/market_chart` response body
#[derive(Debug, Deserialize)]
struct MarketChart {
    /// `[timestamp_ms, price]` pairs
    prices: Vec<[f64; 2]>,
}

impl MarketChart {
    fn into_series(self, token: &str) -> Result<PriceSeries> {
        let points = self
            .prices
            .into_iter()
            .map(|[ts, price]| {
                #[allow(clippy::cast_possible_truncation)]
                let timestamp = DateTime::from_timestamp_millis(ts as i64).ok_or_else(|| {
                    AdvisorError::Config(format!("invalid timestamp {ts} in {token} history"))
                })?;
                let price = Decimal::from_f64(price)
                    .ok_or_else(|| AdvisorError::PriceUnavailable(token.to_string()))?;
                Ok(PricePoint::new(timestamp, price))
            })
            .collect::<Result<Vec<_>>>()?;

        PriceSeries::new(token, points)
    }
}

/// CoinGecko market chart client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl CoinGeckoClient {
    /// Create a client against `base_url` with default timeouts and retry policy
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_settings(&ProviderSettings {
            base_url: base_url.into(),
            ..ProviderSettings::default()
        })
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(concat!("dca-advisor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            retry: settings.retry_policy(),
        })
    }

    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Single request, no retries
    async fn request_market_chart(&self, token: &str, lookback_days: u32) -> Result<MarketChart> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, token);
        let days = lookback_days.to_string();

        let mut request = self
            .client
            .get(&url)
            .query(&[("vs_currency", "usd"), ("days", days.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(token, &e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AdvisorError::RateLimited {
                token: token.to_string(),
            });
        }
        if !status.is_success() {
            return Err(AdvisorError::HttpStatus {
                token: token.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(token, &e))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn transport_error(token: &str, err: &reqwest::Error) -> AdvisorError {
    AdvisorError::Transport {
        token: token.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch_history(&self, token: &str, lookback_days: u32) -> Result<PriceSeries> {
        if lookback_days == 0 {
            return Err(AdvisorError::Config("lookback_days must be positive".into()));
        }

        let retried = self
            .retry
            .run(token, |_| self.request_market_chart(token, lookback_days))
            .await;
        debug!(
            token,
            attempts = retried.attempts,
            waits = ?retried.waits,
            "Market chart request finished"
        );

        let series = retried.result?.into_series(token)?;
        info!(token, points = series.len(), "Fetched price history");
        Ok(series)
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn client(server: &MockServer, max_retries: u32) -> CoinGeckoClient {
        CoinGeckoClient::new(server.base_url())
            .unwrap()
            .with_retry_policy(RetryPolicy::new(max_retries, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_fetch_history_parses_and_sorts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/coins/bitcoin/market_chart")
                    .query_param("vs_currency", "usd")
                    .query_param("days", "7");
                then.status(200).json_body(json!({
                    "prices": [
                        [1_700_003_600_000_i64, 101.5],
                        [1_700_000_000_000_i64, 100.0]
                    ],
                    "market_caps": [],
                    "total_volumes": []
                }));
            })
            .await;

        let series = client(&server, 3).fetch_history("bitcoin", 7).await.unwrap();

        mock.assert_async().await;
        assert_eq!(series.token(), "bitcoin");
        assert_eq!(series.len(), 2);
        assert_eq!(series.oldest().price, dec!(100));
        assert_eq!(series.latest().price, dec!(101.5));
    }

    #[tokio::test]
    async fn test_fetch_history_retries_rate_limit_until_exhausted() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/coins/ethereum/market_chart");
                then.status(429);
            })
            .await;

        let result = client(&server, 3).fetch_history("ethereum", 7).await;

        mock.assert_hits_async(3).await;
        assert!(matches!(
            result,
            Err(AdvisorError::RetriesExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_history_unexpected_status_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/coins/not-a-coin/market_chart");
                then.status(404);
            })
            .await;

        let result = client(&server, 5).fetch_history("not-a-coin", 7).await;

        mock.assert_hits_async(1).await;
        assert!(matches!(
            result,
            Err(AdvisorError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_history_empty_prices_is_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/coins/solana/market_chart");
                then.status(200).json_body(json!({ "prices": [] }));
            })
            .await;

        let result = client(&server, 3).fetch_history("solana", 7).await;
        assert!(matches!(result, Err(AdvisorError::EmptyHistory(t)) if t == "solana"));
    }

    #[tokio::test]
    async fn test_fetch_history_sends_api_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/coins/bitcoin/market_chart")
                    .header(API_KEY_HEADER, "demo-key");
                then.status(200)
                    .json_body(json!({ "prices": [[1_700_000_000_000_i64, 1.0]] }));
            })
            .await;

        let settings = ProviderSettings {
            base_url: server.base_url(),
            api_key: Some("demo-key".into()),
            ..ProviderSettings::default()
        };
        let client = CoinGeckoClient::from_settings(&settings).unwrap();

        assert!(client.fetch_history("bitcoin", 7).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_lookback_rejected_before_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200);
            })
            .await;

        let result = client(&server, 3).fetch_history("bitcoin", 0).await;

        assert!(matches!(result, Err(AdvisorError::Config(_))));
        mock.assert_hits_async(0).await;
    }
}
