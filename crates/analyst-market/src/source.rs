//! Upstream market data boundary
//!
//! [`MarketDataSource`] is the seam between the gateway and whatever
//! provider actually answers. [`LiveMarketSource`] combines Yahoo Finance
//! price histories with Finnhub fundamentals and puts a TTL cache in front
//! of both.

use crate::api::finnhub::{FinnhubFiling, FinnhubReportLine};
use crate::api::{FinnhubClient, YahooFinanceClient};
use crate::cache::{CacheKey, CacheManager};
use crate::config::MarketConfig;
use crate::error::{MarketError, Result};
use crate::types::{
    CompanyProfile, FinancialReport, Interval, NewsItem, Period, PriceBar, RecommendationTrend,
    StatementLines,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;

/// Raw data provider consumed by the gateway
///
/// Implementations return provider data unshaped; rounding, capping and
/// error payloads are the gateway's job.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Bars ascending by date; an empty vector means "no data"
    async fn price_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<PriceBar>>;

    /// Descriptive and valuation data for a company
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile>;

    /// Recent news, newest first
    async fn company_news(&self, symbol: &str) -> Result<Vec<NewsItem>>;

    /// Monthly analyst rating counts
    async fn recommendation_trends(&self, symbol: &str) -> Result<Vec<RecommendationTrend>>;

    /// Reported statements, newest period first
    async fn financial_statements(&self, symbol: &str) -> Result<Vec<FinancialReport>>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Yahoo Finance for prices, Finnhub for everything else
pub struct LiveMarketSource {
    yahoo: YahooFinanceClient,
    finnhub: Option<FinnhubClient>,
    caches: CacheManager,
    config: MarketConfig,
}

impl LiveMarketSource {
    /// Build clients and caches from `config`
    pub fn from_config(config: MarketConfig) -> Result<Self> {
        config.validate()?;

        let yahoo = YahooFinanceClient::new(config.request_timeout)?;
        let finnhub = match &config.finnhub_api_key {
            Some(key) => Some(FinnhubClient::new(
                key.clone(),
                config.finnhub_rate_limit,
                config.request_timeout,
            )?),
            None => {
                tracing::warn!(
                    "FINNHUB_API_KEY not set; profile, news, analyst and statement lookups are disabled"
                );
                None
            }
        };

        Ok(Self {
            yahoo,
            finnhub,
            caches: CacheManager::new(&config),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    fn finnhub(&self) -> Result<&FinnhubClient> {
        self.finnhub
            .as_ref()
            .ok_or_else(|| MarketError::ConfigError("FINNHUB_API_KEY not set".to_string()))
    }
}

#[async_trait]
impl MarketDataSource for LiveMarketSource {
    async fn price_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let key = CacheKey::new(
            symbol,
            "history",
            json!({ "period": period, "interval": interval }),
        );
        self.caches
            .prices
            .get_or_fetch(key, || self.yahoo.get_price_history(symbol, period, interval))
            .await
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let finnhub = self.finnhub()?;
        let key = CacheKey::new(symbol, "profile", json!({}));

        self.caches
            .profiles
            .get_or_fetch(key, || async {
                let profile = finnhub.get_company_profile(symbol).await?;
                // Metrics are optional garnish on the profile.
                let metrics = match finnhub.get_basic_financials(symbol).await {
                    Ok(m) => Some(m),
                    Err(e) => {
                        tracing::debug!(symbol, error = %e, "Finnhub metrics unavailable");
                        None
                    }
                };
                let metric = |keys: &[&str]| metrics.as_ref().and_then(|m| m.first_of(keys));

                Ok::<_, MarketError>(CompanyProfile {
                    name: profile.name,
                    sector: profile.finnhub_industry.clone(),
                    industry: profile.finnhub_industry,
                    exchange: profile.exchange,
                    currency: profile.currency,
                    website: profile.weburl,
                    description: None,
                    market_cap: profile.market_capitalization.map(|m| m * 1_000_000.0),
                    pe_ratio: metric(&["peTTM", "peBasicExclExtraTTM", "peNormalizedAnnual"]),
                    eps: metric(&["epsTTM", "epsBasicExclExtraItemsTTM"]),
                    beta: metric(&["beta"]),
                    dividend_yield: metric(&[
                        "currentDividendYieldTTM",
                        "dividendYieldIndicatedAnnual",
                    ]),
                })
            })
            .await
    }

    async fn company_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        let finnhub = self.finnhub()?;
        let to = Utc::now();
        let from = to - ChronoDuration::days(i64::from(self.config.news_lookback_days));
        let (from, to) = (
            from.format("%Y-%m-%d").to_string(),
            to.format("%Y-%m-%d").to_string(),
        );
        let key = CacheKey::new(symbol, "news", json!({ "from": from, "to": to }));

        self.caches
            .news
            .get_or_fetch(key, || async {
                let mut articles = finnhub.get_company_news(symbol, &from, &to).await?;
                articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));

                Ok::<_, MarketError>(articles
                    .into_iter()
                    .map(|a| NewsItem {
                        published: DateTime::<Utc>::from_timestamp(a.datetime, 0)
                            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default(),
                        title: a.headline,
                        publisher: a.source,
                        link: a.url,
                        summary: a.summary,
                        thumbnail: a.image,
                    })
                    .collect())
            })
            .await
    }

    async fn recommendation_trends(&self, symbol: &str) -> Result<Vec<RecommendationTrend>> {
        let finnhub = self.finnhub()?;
        let key = CacheKey::new(symbol, "recommendation", json!({}));

        self.caches
            .trends
            .get_or_fetch(key, || async {
                let rows = finnhub.get_recommendation_trends(symbol).await?;
                Ok::<_, MarketError>(rows
                    .into_iter()
                    .map(|r| RecommendationTrend {
                        period: r.period,
                        strong_buy: r.strong_buy,
                        buy: r.buy,
                        hold: r.hold,
                        sell: r.sell,
                        strong_sell: r.strong_sell,
                    })
                    .collect())
            })
            .await
    }

    async fn financial_statements(&self, symbol: &str) -> Result<Vec<FinancialReport>> {
        let finnhub = self.finnhub()?;
        let key = CacheKey::new(symbol, "financials", json!({ "freq": "annual" }));

        self.caches
            .statements
            .get_or_fetch(key, || async {
                let filings = finnhub.get_financials_reported(symbol).await?;
                Ok::<_, MarketError>(filings.into_iter().map(report_from_filing).collect())
            })
            .await
    }

    fn name(&self) -> &str {
        "yahoo+finnhub"
    }
}

fn report_from_filing(filing: FinnhubFiling) -> FinancialReport {
    let end_date = filing
        .end_date
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();

    FinancialReport {
        end_date,
        income_statement: statement_lines(&filing.report.ic),
        balance_sheet: statement_lines(&filing.report.bs),
        cash_flow: statement_lines(&filing.report.cf),
    }
}

/// Numeric lines keyed by label; non-numeric values are dropped
fn statement_lines(lines: &[FinnhubReportLine]) -> StatementLines {
    lines
        .iter()
        .filter_map(|line| {
            let value = line.value.as_f64()?;
            let label = if line.label.is_empty() {
                &line.concept
            } else {
                &line.label
            };
            Some((label.clone(), value))
        })
        .collect()
}
