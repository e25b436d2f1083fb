//! Market-wide views

use analyst_chat::MarketSummary;
use analyst_market::{IndexSnapshot, MarketType, Mover, Movers};
use axum::Json;
use axum::extract::{Query, State};
use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::ApiError;
use crate::state::AppState;

/// Local hours during which the market is reported as open
const OPEN_HOURS: Range<u32> = 9..16;

/// Movers shown on the dashboard summary
const SUMMARY_MOVERS: usize = 5;

#[derive(Debug, Serialize)]
pub struct MarketOverview {
    pub market_status: &'static str,
    pub major_indices: Vec<IndexSnapshot>,
    pub top_gainers: Vec<Mover>,
    pub top_losers: Vec<Mover>,
    pub last_updated: String,
}

#[derive(Debug, Serialize)]
pub struct IndicesResponse {
    pub indices: Vec<IndexSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct MoversQuery {
    #[serde(default)]
    pub market_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

pub(crate) fn default_limit() -> usize {
    10
}

/// `GET /api/market/summary`
pub async fn summary(State(state): State<AppState>) -> Json<MarketOverview> {
    let major_indices = state.gateway.market_indices().await;
    let movers = state
        .gateway
        .top_movers(MarketType::Stocks, SUMMARY_MOVERS)
        .await;
    let now = Local::now();

    Json(MarketOverview {
        market_status: if OPEN_HOURS.contains(&now.hour()) {
            "open"
        } else {
            "closed"
        },
        major_indices,
        top_gainers: movers.gainers,
        top_losers: movers.losers,
        last_updated: now.to_rfc3339(),
    })
}

/// `GET /api/market/ai-summary`
pub async fn ai_summary(State(state): State<AppState>) -> Result<Json<MarketSummary>, ApiError> {
    Ok(Json(state.analyst.market_summary().await?))
}

/// `GET /api/market/indices`
pub async fn indices(State(state): State<AppState>) -> Json<IndicesResponse> {
    Json(IndicesResponse {
        indices: state.gateway.market_indices().await,
    })
}

/// `GET /api/market/movers?market_type=stocks&limit=10`
///
/// An unrecognised `market_type` falls back to stocks.
pub async fn movers(State(state): State<AppState>, Query(query): Query<MoversQuery>) -> Json<Movers> {
    let market_type = query
        .market_type
        .as_deref()
        .and_then(|raw| raw.parse::<MarketType>().ok())
        .unwrap_or_default();

    Json(state.gateway.top_movers(market_type, query.limit).await)
}
