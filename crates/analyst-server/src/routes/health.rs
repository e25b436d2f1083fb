//! Service banner and liveness check

use axum::Json;
use chrono::Local;
use serde::Serialize;
use serde_json::{Value, json};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Stock AI Analyst API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "users": "/api/users",
            "chat": "/api/chat",
            "market": "/api/market",
            "stocks": "/api/stocks",
            "scheduler": "/api/scheduler"
        }
    }))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Local::now().to_rfc3339(),
    })
}
