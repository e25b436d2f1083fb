//! In-process market data source
//!
//! Serves canned data for offline runs and tests. Symbols are matched
//! case-insensitively.

use crate::error::{MarketError, Result};
use crate::source::MarketDataSource;
use crate::types::{
    CompanyProfile, FinancialReport, Interval, NewsItem, Period, PriceBar, RecommendationTrend,
};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};

/// Static market data keyed by symbol
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    histories: HashMap<String, Vec<PriceBar>>,
    profiles: HashMap<String, CompanyProfile>,
    news: HashMap<String, Vec<NewsItem>>,
    trends: HashMap<String, Vec<RecommendationTrend>>,
    reports: HashMap<String, Vec<FinancialReport>>,
    failing: HashSet<String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bars` for every period and interval of `symbol`
    pub fn with_history(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.histories.insert(key(symbol), bars);
        self
    }

    /// Daily bars with the given closes, one day apart from 2024-01-01
    pub fn with_closes(self, symbol: &str, closes: &[f64]) -> Self {
        let bars = daily_bars(closes);
        self.with_history(symbol, bars)
    }

    pub fn with_profile(mut self, symbol: &str, profile: CompanyProfile) -> Self {
        self.profiles.insert(key(symbol), profile);
        self
    }

    pub fn with_news(mut self, symbol: &str, news: Vec<NewsItem>) -> Self {
        self.news.insert(key(symbol), news);
        self
    }

    pub fn with_trends(mut self, symbol: &str, trends: Vec<RecommendationTrend>) -> Self {
        self.trends.insert(key(symbol), trends);
        self
    }

    pub fn with_reports(mut self, symbol: &str, reports: Vec<FinancialReport>) -> Self {
        self.reports.insert(key(symbol), reports);
        self
    }

    /// Every lookup for `symbol` fails with an upstream error
    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.failing.insert(key(symbol));
        self
    }

    fn check(&self, symbol: &str) -> Result<String> {
        let k = key(symbol);
        if self.failing.contains(&k) {
            return Err(MarketError::upstream(
                symbol,
                format!("simulated provider failure for {k}"),
            ));
        }
        Ok(k)
    }

    fn lookup<T: Clone>(&self, map: &HashMap<String, T>, symbol: &str, what: &str) -> Result<T> {
        let k = self.check(symbol)?;
        map.get(&k)
            .cloned()
            .ok_or_else(|| MarketError::upstream(symbol, format!("no {what} for {k}")))
    }
}

fn key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Daily bars with open = previous close and a 1% range around the close
pub fn daily_bars(closes: &[f64]) -> Vec<PriceBar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();

    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: start + Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 1_000_000 + i as u64 * 1_000,
            }
        })
        .collect()
}

#[async_trait]
impl MarketDataSource for InMemorySource {
    async fn price_history(
        &self,
        symbol: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let k = self.check(symbol)?;
        Ok(self.histories.get(&k).cloned().unwrap_or_default())
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        self.lookup(&self.profiles, symbol, "profile")
    }

    async fn company_news(&self, symbol: &str) -> Result<Vec<NewsItem>> {
        self.lookup(&self.news, symbol, "news")
    }

    async fn recommendation_trends(&self, symbol: &str) -> Result<Vec<RecommendationTrend>> {
        self.lookup(&self.trends, symbol, "recommendation trends")
    }

    async fn financial_statements(&self, symbol: &str) -> Result<Vec<FinancialReport>> {
        self.lookup(&self.reports, symbol, "financial statements")
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
