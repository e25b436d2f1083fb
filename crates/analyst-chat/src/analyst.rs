//! Single-completion analyses: market summary and stock recommendation

use crate::config::ChatConfig;
use crate::error::Result;
use crate::prompts::{SYSTEM_PROMPT, market_summary_prompt, recommendation_prompt};
use analyst_llm::{CompletionRequest, LLMProvider, Message};
use analyst_market::{IndexSnapshot, MarketGateway, MarketType, Movers};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// Movers fetched for a market summary
const SUMMARY_MOVERS: usize = 5;

/// News items embedded in a recommendation prompt
const RECOMMENDATION_NEWS: usize = 5;

/// Narrative market overview with the data it was written from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub summary: String,
    pub indices: Vec<IndexSnapshot>,
    pub movers: Movers,
}

/// Data a recommendation was based on; each entry may be an error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationData {
    pub info: Value,
    pub technicals: Value,
    pub news: Value,
    pub recommendations: Value,
}

/// BUY / SELL / HOLD analysis of one stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecommendation {
    pub symbol: String,
    pub analysis: String,
    pub data: RecommendationData,
}

/// Writes market summaries and stock recommendations
#[derive(Clone)]
pub struct StockAnalyst {
    provider: Arc<dyn LLMProvider>,
    gateway: MarketGateway,
    config: ChatConfig,
}

impl StockAnalyst {
    pub fn new(provider: Arc<dyn LLMProvider>, gateway: MarketGateway, config: ChatConfig) -> Self {
        Self {
            provider,
            gateway,
            config,
        }
    }

    pub fn gateway(&self) -> &MarketGateway {
        &self.gateway
    }

    /// Overview of index levels and the day's top equity movers
    pub async fn market_summary(&self) -> Result<MarketSummary> {
        let indices = self.gateway.market_indices().await;
        let movers = self
            .gateway
            .top_movers(MarketType::Stocks, SUMMARY_MOVERS)
            .await;

        let prompt = market_summary_prompt(&indices, &movers)?;
        let summary = self.complete(prompt).await?;
        info!(indices = indices.len(), "Market summary generated");

        Ok(MarketSummary {
            summary,
            indices,
            movers,
        })
    }

    /// Recommendation for `symbol` from quote, indicators, news and analyst
    /// trends
    ///
    /// Missing data is passed to the model as error payloads; only a failed
    /// completion fails the call.
    pub async fn stock_recommendation(&self, symbol: &str) -> Result<StockRecommendation> {
        let symbol = symbol.trim().to_uppercase();

        let info = payload(self.gateway.stock_info(&symbol).await);
        let technicals = payload(self.gateway.technicals(&symbol).await);
        let news = payload(self.gateway.stock_news(&symbol).await.map(|mut news| {
            news.truncate(RECOMMENDATION_NEWS);
            news
        }));
        let recommendations = payload(self.gateway.recommendations(&symbol).await);

        let prompt = recommendation_prompt(&info, &technicals, &news, &recommendations)?;
        let analysis = self.complete(prompt).await?;
        info!(symbol = %symbol, "Stock recommendation generated");

        Ok(StockRecommendation {
            symbol,
            analysis,
            data: RecommendationData {
                info,
                technicals,
                news,
                recommendations,
            },
        })
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .system(SYSTEM_PROMPT)
            .add_message(Message::user(prompt))
            .max_tokens(self.config.max_tokens);
        if let Some(t) = self.config.temperature {
            builder = builder.temperature(t);
        }

        let response = self.provider.complete(builder.build()).await?;
        Ok(response.message.text().unwrap_or_default().to_string())
    }
}

fn payload<T: Serialize>(result: analyst_market::Result<T>) -> Value {
    match result {
        Ok(value) => serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() })),
        Err(e) => e.to_payload(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, text_response};
    use analyst_llm::LLMError;
    use analyst_market::{InMemorySource, NewsItem};

    fn news(n: usize) -> Vec<NewsItem> {
        (0..n)
            .map(|i| NewsItem {
                title: format!("Story {i}"),
                publisher: "Wire".to_string(),
                link: format!("https://news.example/{i}"),
                published: "2024-06-01 12:00".to_string(),
                summary: String::new(),
                thumbnail: String::new(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_recommendation_embeds_data_and_errors() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i)).collect();
        let source = InMemorySource::new()
            .with_closes("NVDA", &closes)
            .with_news("NVDA", news(8));
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("BUY, confidence 7"))]));
        let analyst = StockAnalyst::new(
            provider.clone(),
            MarketGateway::with_default_universe(Arc::new(source)),
            ChatConfig::default(),
        );

        let rec = analyst.stock_recommendation("nvda").await.unwrap();

        assert_eq!(rec.symbol, "NVDA");
        assert_eq!(rec.analysis, "BUY, confidence 7");
        assert_eq!(rec.data.info["current_price"], 139.0);
        assert_eq!(rec.data.news.as_array().unwrap().len(), 5);
        // No trends configured: an error payload, not a failure.
        assert_eq!(rec.data.recommendations["symbol"], "NVDA");
        assert!(rec.data.recommendations["error"].is_string());

        let request = provider.request(0);
        assert!(request.tools.is_none());
        let prompt = request.messages[0].text().unwrap();
        assert!(prompt.contains("Story 4"));
        assert!(!prompt.contains("Story 5"));
    }

    #[tokio::test]
    async fn test_market_summary() {
        let source = InMemorySource::new()
            .with_closes("^GSPC", &[5000.0, 5025.0])
            .with_closes("TSLA", &[200.0, 210.0]);
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(text_response("Risk-on day."))]));
        let analyst = StockAnalyst::new(
            provider,
            MarketGateway::with_default_universe(Arc::new(source)),
            ChatConfig::default(),
        );

        let summary = analyst.market_summary().await.unwrap();
        assert_eq!(summary.summary, "Risk-on day.");
        assert_eq!(summary.indices.len(), 1);
        assert_eq!(summary.movers.gainers[0].symbol, "TSLA");
    }

    #[tokio::test]
    async fn test_completion_failure_is_an_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(LLMError::RateLimitExceeded(
            "slow down".to_string(),
        ))]));
        let analyst = StockAnalyst::new(
            provider,
            MarketGateway::with_default_universe(Arc::new(InMemorySource::new())),
            ChatConfig::default(),
        );

        let err = analyst.market_summary().await.unwrap_err();
        assert!(err.to_string().contains("slow down"));
    }
}
