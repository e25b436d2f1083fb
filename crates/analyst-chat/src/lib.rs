//! Tool-augmented chat and AI market analysis for stock-analyst
//!
//! - [`ChatOrchestrator`] runs the model / tool loop behind `/api/chat`
//! - [`StockAnalyst`] writes single-completion market summaries and
//!   BUY / SELL / HOLD recommendations
//! - [`tools::market_tools`] builds the fixed registry of eight market data
//!   tools the model may call
//!
//! # Example
//!
//! ```rust,ignore
//! use analyst_chat::{ChatConfig, ChatOrchestrator, tools::market_tools};
//! use analyst_llm::providers::OpenAIProvider;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(OpenAIProvider::from_env()?);
//! let tools = Arc::new(market_tools(&gateway)?);
//! let chat = ChatOrchestrator::new(provider, tools, ChatConfig::from_env()?);
//!
//! let reply = chat.chat("Is NVDA overbought?", Some("NVDA"), vec![]).await;
//! println!("{}", reply.response);
//! ```

pub mod analyst;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod tools;

#[cfg(test)]
mod testing;

pub use analyst::{MarketSummary, RecommendationData, StockAnalyst, StockRecommendation};
pub use config::ChatConfig;
pub use error::{ChatError, Result};
pub use orchestrator::{ChatOrchestrator, ChatReply};
