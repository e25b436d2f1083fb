//! Configuration for market data access

use crate::error::{MarketError, Result};
use analyst_utils::env_parse;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for market data access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Cache TTL for real-time data (quotes, short price histories)
    pub cache_ttl_realtime: Duration,

    /// Cache TTL for fundamental data (profiles, statements, analyst trends)
    pub cache_ttl_fundamental: Duration,

    /// Cache TTL for news data
    pub cache_ttl_news: Duration,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Finnhub API key (optional; profile, news, analyst and statement
    /// lookups are unavailable without it)
    pub finnhub_api_key: Option<String>,

    /// Finnhub requests per minute
    pub finnhub_rate_limit: u32,

    /// How many days back company news is searched
    pub news_lookback_days: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            cache_ttl_realtime: Duration::from_secs(60),
            cache_ttl_fundamental: Duration::from_secs(3600),
            cache_ttl_news: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            finnhub_api_key: None,
            finnhub_rate_limit: 60,
            news_lookback_days: 7,
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Build a configuration from the environment
    ///
    /// Reads `FINNHUB_API_KEY`, `FINNHUB_RATE_LIMIT`,
    /// `MARKET_REQUEST_TIMEOUT_SECS` and `MARKET_CACHE_TTL_SECS`.
    pub fn from_env() -> Result<Self> {
        let to_config_err = |e: analyst_utils::ConfigError| MarketError::ConfigError(e.to_string());

        let mut builder = Self::builder();
        if let Ok(key) = std::env::var("FINNHUB_API_KEY") {
            if !key.trim().is_empty() {
                builder = builder.finnhub_api_key(key);
            }
        }
        if let Some(limit) = env_parse::<u32>("FINNHUB_RATE_LIMIT").map_err(to_config_err)? {
            builder = builder.finnhub_rate_limit(limit);
        }
        if let Some(secs) = env_parse::<u64>("MARKET_REQUEST_TIMEOUT_SECS").map_err(to_config_err)? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>("MARKET_CACHE_TTL_SECS").map_err(to_config_err)? {
            builder = builder.cache_ttl_realtime(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// Whether Finnhub-backed lookups are available
    pub fn has_finnhub(&self) -> bool {
        self.finnhub_api_key.is_some()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.finnhub_rate_limit == 0 {
            return Err(MarketError::ConfigError(
                "finnhub_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(MarketError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.news_lookback_days == 0 {
            return Err(MarketError::ConfigError(
                "news_lookback_days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    cache_ttl_realtime: Option<Duration>,
    cache_ttl_fundamental: Option<Duration>,
    cache_ttl_news: Option<Duration>,
    request_timeout: Option<Duration>,
    finnhub_api_key: Option<String>,
    finnhub_rate_limit: Option<u32>,
    news_lookback_days: Option<u32>,
}

impl MarketConfigBuilder {
    /// Set cache TTL for real-time data
    pub fn cache_ttl_realtime(mut self, duration: Duration) -> Self {
        self.cache_ttl_realtime = Some(duration);
        self
    }

    /// Set cache TTL for fundamental data
    pub fn cache_ttl_fundamental(mut self, duration: Duration) -> Self {
        self.cache_ttl_fundamental = Some(duration);
        self
    }

    /// Set cache TTL for news data
    pub fn cache_ttl_news(mut self, duration: Duration) -> Self {
        self.cache_ttl_news = Some(duration);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set Finnhub API key
    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    /// Set Finnhub requests per minute
    pub fn finnhub_rate_limit(mut self, per_minute: u32) -> Self {
        self.finnhub_rate_limit = Some(per_minute);
        self
    }

    /// Set the news lookback window in days
    pub fn news_lookback_days(mut self, days: u32) -> Self {
        self.news_lookback_days = Some(days);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            cache_ttl_realtime: self.cache_ttl_realtime.unwrap_or(defaults.cache_ttl_realtime),
            cache_ttl_fundamental: self
                .cache_ttl_fundamental
                .unwrap_or(defaults.cache_ttl_fundamental),
            cache_ttl_news: self.cache_ttl_news.unwrap_or(defaults.cache_ttl_news),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            finnhub_api_key: self.finnhub_api_key,
            finnhub_rate_limit: self.finnhub_rate_limit.unwrap_or(defaults.finnhub_rate_limit),
            news_lookback_days: self.news_lookback_days.unwrap_or(defaults.news_lookback_days),
        };

        config.validate()?;
        Ok(config)
    }
}
