//! Market data and technical analysis for stock-analyst
//!
//! - [`indicators`]: pure SMA / RSI / MACD computation and signal wording
//! - [`MarketGateway`]: shapes provider data into quote snapshots, price
//!   histories, news, statements, analyst trends, index snapshots and
//!   top movers
//! - [`MarketDataSource`]: the upstream provider seam, with a live
//!   Yahoo Finance + Finnhub implementation and an in-memory one
//!
//! # Example
//!
//! ```rust,ignore
//! use analyst_market::{LiveMarketSource, MarketConfig, MarketGateway};
//! use std::sync::Arc;
//!
//! let source = LiveMarketSource::from_config(MarketConfig::from_env()?)?;
//! let gateway = MarketGateway::with_default_universe(Arc::new(source));
//! let report = gateway.technicals("AAPL").await?;
//! println!("{:?}", report.signals);
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod indicators;
pub mod memory;
pub mod source;
pub mod types;
pub mod universe;

pub use config::MarketConfig;
pub use error::{MarketError, Result};
pub use gateway::{MarketGateway, rank_movers};
pub use indicators::IndicatorReport;
pub use memory::InMemorySource;
pub use source::{LiveMarketSource, MarketDataSource};
pub use types::{
    CompanyProfile, FinancialReport, Financials, IndexSnapshot, Interval, MarketType, Mover,
    Movers, NewsItem, Period, PriceBar, PriceHistory, RecommendationTrend, Recommendations,
    SearchHit, StockInfo,
};
pub use universe::{Listing, Universe};
