//! Finnhub API client for company profiles, news, analyst trends and
//! reported financial statements

use crate::error::{MarketError, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub company profile (`/stock/profile2`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinnhubProfile {
    pub name: Option<String>,
    pub ticker: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub finnhub_industry: Option<String>,
    pub weburl: Option<String>,
    /// In millions of the listing currency
    pub market_capitalization: Option<f64>,
}

/// Finnhub basic financials (`/stock/metric?metric=all`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinnhubMetrics {
    pub metric: HashMap<String, Value>,
}

impl FinnhubMetrics {
    /// First numeric metric found among `keys`
    pub fn first_of(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .find_map(|k| self.metric.get(*k).and_then(Value::as_f64))
    }
}

/// Finnhub news article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinnhubNewsArticle {
    /// Article category
    pub category: String,
    /// Publish time (UNIX timestamp)
    pub datetime: i64,
    /// News headline
    pub headline: String,
    /// Unique article ID
    pub id: i64,
    /// Thumbnail image URL
    pub image: String,
    /// Related symbols
    pub related: String,
    /// News source
    pub source: String,
    /// Article summary
    pub summary: String,
    /// Article URL
    pub url: String,
}

/// Monthly analyst recommendation counts (`/stock/recommendation`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinnhubRecommendation {
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// One line of a reported statement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinnhubReportLine {
    pub concept: String,
    pub label: String,
    pub value: Value,
}

/// Statements of one filing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinnhubReportBody {
    /// Balance sheet
    pub bs: Vec<FinnhubReportLine>,
    /// Income statement
    pub ic: Vec<FinnhubReportLine>,
    /// Cash flow statement
    pub cf: Vec<FinnhubReportLine>,
}

/// One filing (`/stock/financials-reported`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinnhubFiling {
    pub end_date: String,
    pub year: i32,
    pub quarter: i32,
    pub report: FinnhubReportBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FinnhubFilings {
    data: Vec<FinnhubFiling>,
}

/// Finnhub REST client with client-side rate limiting
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Point the client at another Finnhub-compatible base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Company profile for `symbol`
    pub async fn get_company_profile(&self, symbol: &str) -> Result<FinnhubProfile> {
        self.get(symbol, "/stock/profile2", &[("symbol", symbol)])
            .await
    }

    /// Valuation and risk metrics for `symbol`
    pub async fn get_basic_financials(&self, symbol: &str) -> Result<FinnhubMetrics> {
        self.get(symbol, "/stock/metric", &[("symbol", symbol), ("metric", "all")])
            .await
    }

    /// Get company news for a specific symbol
    ///
    /// # Arguments
    /// * `symbol` - Stock symbol (e.g., "AAPL")
    /// * `from` - Start date (YYYY-MM-DD)
    /// * `to` - End date (YYYY-MM-DD)
    pub async fn get_company_news(
        &self,
        symbol: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<FinnhubNewsArticle>> {
        self.get(
            symbol,
            "/company-news",
            &[("symbol", symbol), ("from", from), ("to", to)],
        )
        .await
    }

    /// Monthly analyst recommendation trends, newest first
    pub async fn get_recommendation_trends(
        &self,
        symbol: &str,
    ) -> Result<Vec<FinnhubRecommendation>> {
        self.get(symbol, "/stock/recommendation", &[("symbol", symbol)])
            .await
    }

    /// Annual statements as reported, newest first
    pub async fn get_financials_reported(&self, symbol: &str) -> Result<Vec<FinnhubFiling>> {
        let filings: FinnhubFilings = self
            .get(
                symbol,
                "/stock/financials-reported",
                &[("symbol", symbol), ("freq", "annual")],
            )
            .await?;
        Ok(filings.data)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        symbol: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| MarketError::upstream(symbol, format!("Finnhub request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketError::RateLimitExceeded {
                provider: "finnhub".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::upstream(
                symbol,
                format!("Finnhub API error {status}: {body}"),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            MarketError::upstream(symbol, format!("Failed to parse Finnhub response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finnhub_client_creation() {
        let client = FinnhubClient::new("test_key", 60, Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/api/v1/");
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.base_url, "http://localhost:9999/api/v1");
    }

    #[test]
    fn test_zero_rate_limit_does_not_panic() {
        assert!(FinnhubClient::new("k", 0, Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_profile_deserializes_camel_case() {
        let profile: FinnhubProfile = serde_json::from_value(json!({
            "name": "Apple Inc",
            "finnhubIndustry": "Technology",
            "marketCapitalization": 2_900_000.5,
            "weburl": "https://www.apple.com/"
        }))
        .unwrap();

        assert_eq!(profile.finnhub_industry.as_deref(), Some("Technology"));
        assert_eq!(profile.market_capitalization, Some(2_900_000.5));
    }

    #[test]
    fn test_empty_profile_for_unknown_symbol() {
        let profile: FinnhubProfile = serde_json::from_value(json!({})).unwrap();
        assert!(profile.name.is_none());
    }

    #[test]
    fn test_metrics_first_of() {
        let metrics: FinnhubMetrics = serde_json::from_value(json!({
            "metric": {"peTTM": null, "peBasicExclExtraTTM": 28.4, "beta": 1.2}
        }))
        .unwrap();

        assert_eq!(metrics.first_of(&["peTTM", "peBasicExclExtraTTM"]), Some(28.4));
        assert_eq!(metrics.first_of(&["missing"]), None);
    }

    #[test]
    fn test_filing_deserializes() {
        let filings: FinnhubFilings = serde_json::from_value(json!({
            "data": [{
                "endDate": "2023-09-30 00:00:00",
                "year": 2023,
                "quarter": 0,
                "report": {
                    "ic": [{"concept": "us-gaap_Revenues", "label": "Total net sales", "unit": "usd", "value": 383285000000.0}],
                    "bs": [],
                    "cf": []
                }
            }]
        }))
        .unwrap();

        assert_eq!(filings.data.len(), 1);
        assert_eq!(filings.data[0].report.ic[0].label, "Total net sales");
    }
}
