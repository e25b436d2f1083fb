//! Error types for market data operations

use serde_json::{Value, json};
use thiserror::Error;

/// Market data specific errors
///
/// Every variant that concerns a single instrument carries the symbol so
/// the error can be handed back to a caller (or the language model) as a
/// self-describing payload.
#[derive(Debug, Error)]
pub enum MarketError {
    /// The upstream provider failed or returned something unusable
    #[error("{cause}")]
    Upstream { symbol: String, cause: String },

    /// The provider answered but had no data for the request
    #[error("{reason}")]
    NoData { symbol: String, reason: String },

    /// Request parameters were rejected before reaching the provider
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for market operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl MarketError {
    /// Upstream failure for `symbol`
    pub fn upstream(symbol: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Upstream {
            symbol: symbol.into(),
            cause: cause.to_string(),
        }
    }

    /// Missing data for `symbol`
    pub fn no_data(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoData {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Symbol the error refers to, when there is one
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Upstream { symbol, .. } | Self::NoData { symbol, .. } => Some(symbol),
            _ => None,
        }
    }

    /// Whether the error means "nothing to show" rather than a failure
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }

    /// Attach a symbol to errors that were raised without one
    pub fn for_symbol(self, symbol: &str) -> Self {
        match self {
            Self::Upstream { .. } | Self::NoData { .. } => self,
            other => Self::upstream(symbol, other),
        }
    }

    /// Caller-facing payload: `{"error": <cause>, "symbol": <symbol>}`
    pub fn to_payload(&self) -> Value {
        match self.symbol() {
            Some(symbol) => json!({ "error": self.to_string(), "symbol": symbol }),
            None => json!({ "error": self.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::no_data("AAPL", "No historical data available");
        assert_eq!(err.to_string(), "No historical data available");
        assert!(err.is_no_data());

        let err = MarketError::RateLimitExceeded {
            provider: "finnhub".to_string(),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded for finnhub");
    }

    #[test]
    fn test_payload_carries_symbol() {
        let err = MarketError::upstream("MSFT", "connection reset");
        let payload = err.to_payload();
        assert_eq!(payload["error"], "connection reset");
        assert_eq!(payload["symbol"], "MSFT");
    }

    #[test]
    fn test_for_symbol_wraps_generic_errors() {
        let err = MarketError::ConfigError("FINNHUB_API_KEY not set".to_string()).for_symbol("TSLA");
        assert_eq!(err.symbol(), Some("TSLA"));
        assert_eq!(err.to_payload()["error"], "Configuration error: FINNHUB_API_KEY not set");
    }

    #[test]
    fn test_payload_without_symbol() {
        let err = MarketError::InvalidRequest("unknown period: 7y".to_string());
        assert!(err.to_payload().get("symbol").is_none());
    }
}
