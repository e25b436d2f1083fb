//! Caching layer for market data to reduce upstream calls

use crate::config::MarketConfig;
use crate::types::{CompanyProfile, FinancialReport, NewsItem, PriceBar, RecommendationTrend};
use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for market data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Instrument symbol
    pub symbol: String,
    /// Upstream endpoint or operation type
    pub endpoint: String,
    /// Additional parameters as JSON string
    pub params: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(symbol: impl Into<String>, endpoint: impl Into<String>, params: impl Serialize) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint: endpoint.into(),
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }
}

/// Thread-safe expiring cache of values of one type
pub struct MarketCache<V> {
    cache: Arc<RwLock<TimedCache<CacheKey, V>>>,
}

impl<V: Clone> MarketCache<V> {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache, dropping entries whose TTL has elapsed
    ///
    /// Date-scoped keys are never read again once the day rolls over, so
    /// expired entries are swept here rather than on lookup.
    pub async fn insert(&self, key: CacheKey, value: V) {
        let mut cache = self.cache.write().await;
        cache.flush();
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// If the value exists in cache, it's returned immediately.
    /// Otherwise, the fetcher is awaited and a successful result is cached.
    /// Errors are never cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(symbol = %key.symbol, endpoint = %key.endpoint, "Cache hit");
            return Ok(value);
        }

        tracing::debug!(symbol = %key.symbol, endpoint = %key.endpoint, "Cache miss");

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;

        Ok(value)
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V> Clone for MarketCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

/// Per-data-type caches with TTLs matched to how fast the data changes
#[derive(Clone)]
pub struct CacheManager {
    /// Price histories, short TTL
    pub prices: MarketCache<Vec<PriceBar>>,
    /// Company profiles, long TTL
    pub profiles: MarketCache<CompanyProfile>,
    /// Company news, medium TTL
    pub news: MarketCache<Vec<NewsItem>>,
    /// Analyst recommendation trends, long TTL
    pub trends: MarketCache<Vec<RecommendationTrend>>,
    /// Financial statements, long TTL
    pub statements: MarketCache<Vec<FinancialReport>>,
}

impl CacheManager {
    /// Create a cache manager with the TTLs from `config`
    pub fn new(config: &MarketConfig) -> Self {
        Self {
            prices: MarketCache::new(config.cache_ttl_realtime),
            profiles: MarketCache::new(config.cache_ttl_fundamental),
            news: MarketCache::new(config.cache_ttl_news),
            trends: MarketCache::new(config.cache_ttl_fundamental),
            statements: MarketCache::new(config.cache_ttl_fundamental),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_cache_key_creation() {
        let key = CacheKey::new("AAPL", "history", json!({"period": "1mo"}));
        assert_eq!(key.symbol, "AAPL");
        assert_eq!(key.endpoint, "history");
        assert!(key.params.contains("1mo"));
    }

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache = MarketCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "profile", json!({}));
        let profile = CompanyProfile {
            name: Some("Apple Inc.".to_string()),
            ..Default::default()
        };

        cache.insert(key.clone(), profile.clone()).await;

        assert_eq!(cache.get(&key).await, Some(profile));
    }

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache = MarketCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "quote", json!({}));

        let mut call_count = 0;
        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(150.0_f64) }
            })
            .await
            .unwrap();
        assert!((result - 150.0).abs() < f64::EPSILON);
        assert_eq!(call_count, 1);

        let result = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok::<_, String>(999.0_f64) }
            })
            .await
            .unwrap();
        assert!((result - 150.0).abs() < f64::EPSILON);
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: MarketCache<f64> = MarketCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "quote", json!({}));

        let failed = cache
            .get_or_fetch(key.clone(), || async { Err::<f64, _>("upstream down") })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_entries_are_swept_on_insert() {
        let cache = MarketCache::new(Duration::from_millis(20));

        for day in 0..10 {
            let key = CacheKey::new("AAPL", "news", json!({"from": format!("2024-01-{:02}", day + 1)}));
            cache.insert(key, vec![0_u8]).await;
        }
        assert_eq!(cache.len().await, 10);

        tokio::time::sleep(Duration::from_millis(60)).await;
        let key = CacheKey::new("AAPL", "news", json!({"from": "2024-02-01"}));
        cache.insert(key.clone(), vec![1_u8]).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&key).await, Some(vec![1_u8]));
    }

    #[tokio::test]
    async fn test_cache_manager() {
        let manager = CacheManager::new(&MarketConfig::default());
        let key = CacheKey::new("AAPL", "news", json!({}));

        manager.news.insert(key.clone(), vec![]).await;
        manager.trends.insert(key.clone(), vec![]).await;

        assert_eq!(manager.news.len().await, 1);
        assert_eq!(manager.trends.get(&key).await, Some(vec![]));
        assert!(manager.statements.is_empty().await);
    }
}
