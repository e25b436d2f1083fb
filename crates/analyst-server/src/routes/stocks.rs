//! Single-instrument data and search

use analyst_chat::StockRecommendation;
use analyst_market::{
    Financials, IndicatorReport, Interval, NewsItem, Period, PriceHistory, Recommendations,
    SearchHit, StockInfo,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use super::market::default_limit;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub symbol: String,
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// `GET /api/stocks/:symbol`
pub async fn info(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockInfo>, ApiError> {
    Ok(Json(state.gateway.stock_info(&symbol).await?))
}

/// `GET /api/stocks/:symbol/history?period=1mo&interval=1d`
pub async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<PriceHistory>, ApiError> {
    let period = query
        .period
        .as_deref()
        .map_or(Ok(Period::OneMonth), str::parse::<Period>)?;
    let interval = query
        .interval
        .as_deref()
        .map_or(Ok(Interval::OneDay), str::parse::<Interval>)?;

    Ok(Json(
        state
            .gateway
            .historical_data(&symbol, period, interval)
            .await?,
    ))
}

/// `GET /api/stocks/:symbol/news`
pub async fn news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<NewsResponse>, ApiError> {
    let news = state.gateway.stock_news(&symbol).await?;
    Ok(Json(NewsResponse { symbol, news }))
}

/// `GET /api/stocks/:symbol/technicals`
pub async fn technicals(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<IndicatorReport>, ApiError> {
    Ok(Json(state.gateway.technicals(&symbol).await?))
}

/// `GET /api/stocks/:symbol/financials`
pub async fn financials(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Financials>, ApiError> {
    Ok(Json(state.gateway.financials(&symbol).await?))
}

/// `GET /api/stocks/:symbol/recommendations`
pub async fn recommendations(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Recommendations>, ApiError> {
    Ok(Json(state.gateway.recommendations(&symbol).await?))
}

/// `GET /api/stocks/:symbol/ai-analysis`
pub async fn ai_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockRecommendation>, ApiError> {
    Ok(Json(state.analyst.stock_recommendation(&symbol).await?))
}

/// `GET /api/search?query=apple&limit=10`
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let text = query.query.ok_or_else(|| {
        ApiError::BadRequest("Missing required query parameter: query".to_string())
    })?;
    let results = state.gateway.search(&text, query.limit);
    Ok(Json(SearchResponse {
        query: text,
        results,
    }))
}
