//! Yahoo Finance API client

use crate::error::{MarketError, Result};
use crate::types::{Interval, Period, PriceBar};
use chrono::{DateTime, Utc};
use std::time::Duration;
use yahoo_finance_api as yahoo;

/// Yahoo Finance API client for price histories
pub struct YahooFinanceClient {
    connector: yahoo::YahooConnector,
    timeout: Duration,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(timeout: Duration) -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| MarketError::ConfigError(format!("Yahoo Finance connector: {e}")))?;
        Ok(Self { connector, timeout })
    }

    /// Get price bars for a symbol over `period`, one bar per `interval`
    ///
    /// Bars are returned ascending by date. An empty result is not an error
    /// at this level.
    pub async fn get_price_history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let request = self
            .connector
            .get_quote_range(symbol, interval.as_str(), period.as_str());

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                MarketError::upstream(
                    symbol,
                    format!("Yahoo Finance timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| MarketError::upstream(symbol, format!("Yahoo Finance error: {e}")))?;

        let Ok(quotes) = response.quotes() else {
            tracing::debug!(symbol, %period, %interval, "Yahoo returned no quotes");
            return Ok(Vec::new());
        };

        let mut bars: Vec<PriceBar> = quotes
            .iter()
            .filter(|q| q.close.is_finite() && q.close > 0.0)
            .filter_map(|q| {
                DateTime::<Utc>::from_timestamp(q.timestamp as i64, 0).map(|date| PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();
        bars.sort_by_key(|b| b.date);

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_price_history() {
        let client = YahooFinanceClient::new(Duration::from_secs(30)).unwrap();
        let bars = client
            .get_price_history("AAPL", Period::OneMonth, Interval::OneDay)
            .await
            .unwrap();

        assert!(!bars.is_empty());
        assert!(bars.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_symbol_fails() {
        let client = YahooFinanceClient::new(Duration::from_secs(30)).unwrap();
        let result = client
            .get_price_history("INVALID_SYMBOL_12345", Period::FiveDays, Interval::OneDay)
            .await;

        assert!(result.map(|bars| bars.is_empty()).unwrap_or(true));
    }
}
