//! Axum application builder
//!
//! Routes:
//! - `GET /`, `GET /health`
//! - `POST /api/chat`
//! - `GET /api/market/{summary,ai-summary,indices,movers}`
//! - `GET /api/stocks/:symbol` and its `history`, `news`, `technicals`,
//!   `financials`, `recommendations` and `ai-analysis` children
//! - `GET /api/search`
//! - `POST /api/auth/{register,login}`, `POST /api/users`, `GET /api/users/:id`
//! - `/api/scheduler` CRUD, manual test runs and next fire times

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{chat, health, market, scheduler, stocks, users};
use crate::state::AppState;

/// Create the Axum application with all routes.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        // Market overview
        .route("/api/market/summary", get(market::summary))
        .route("/api/market/ai-summary", get(market::ai_summary))
        .route("/api/market/indices", get(market::indices))
        .route("/api/market/movers", get(market::movers))
        // Single instruments
        .route("/api/stocks/:symbol", get(stocks::info))
        .route("/api/stocks/:symbol/history", get(stocks::history))
        .route("/api/stocks/:symbol/news", get(stocks::news))
        .route("/api/stocks/:symbol/technicals", get(stocks::technicals))
        .route("/api/stocks/:symbol/financials", get(stocks::financials))
        .route("/api/stocks/:symbol/recommendations", get(stocks::recommendations))
        .route("/api/stocks/:symbol/ai-analysis", get(stocks::ai_analysis))
        .route("/api/search", get(stocks::search))
        // Users and alerts
        .route("/api/auth/register", post(users::create))
        .route("/api/auth/login", post(users::login))
        .route("/api/users", post(users::create))
        .route("/api/users/:id", get(users::get))
        .route("/api/scheduler", post(scheduler::create))
        .route("/api/scheduler/next-runs", get(scheduler::next_runs))
        .route("/api/scheduler/user/:user_id", get(scheduler::list_for_user))
        .route(
            "/api/scheduler/:id",
            get(scheduler::get).put(scheduler::update).delete(scheduler::delete),
        )
        .route("/api/scheduler/:id/test", post(scheduler::test))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_alerts::{JsonFileStore, LogDispatcher, ScheduleConfig};
    use analyst_chat::ChatConfig;
    use analyst_llm::{
        CompletionRequest, CompletionResponse, LLMProvider, Message, StopReason, TokenUsage,
    };
    use analyst_market::InMemorySource;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};
    use tower::ServiceExt;

    /// Answers every completion with the same text
    struct CannedProvider;

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn complete(&self, _request: CompletionRequest) -> analyst_llm::Result<CompletionResponse> {
            Ok(CompletionResponse {
                message: Message::assistant("HOLD, confidence 5"),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    async fn test_app() -> (Router, TempDir) {
        let dir = tempdir().unwrap();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i)).collect();
        let source = InMemorySource::new()
            .with_closes("AAPL", &closes)
            .with_closes("TSLA", &[200.0, 220.0])
            .with_closes("NVDA", &[100.0, 95.0]);
        let store = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());

        let state = AppState::new(
            Arc::new(CannedProvider),
            Arc::new(source),
            store,
            Arc::new(LogDispatcher),
            ChatConfig::default(),
            ScheduleConfig::default(),
        )
        .unwrap();
        (create_app(state), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn with_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_stock_info_and_missing_symbol() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(&app, get("/api/stocks/aapl")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["current_price"], 159.0);

        let (status, body) = send(&app, get("/api/stocks/ZZZZ")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "No data available");
    }

    #[tokio::test]
    async fn test_history_rejects_unknown_period() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(&app, get("/api/stocks/AAPL/history?period=7y")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");

        let (status, body) = send(&app, get("/api/stocks/AAPL/history")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["period"], "1mo");
    }

    #[tokio::test]
    async fn test_movers_and_search() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(&app, get("/api/market/movers?market_type=bogus&limit=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gainers"].as_array().unwrap().len(), 1);
        assert_eq!(body["gainers"][0]["symbol"], "TSLA");
        assert_eq!(body["losers"][0]["symbol"], "NVDA");

        let (status, body) = send(&app, get("/api/search?query=apple")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "apple");
        assert_eq!(body["results"][0]["symbol"], "AAPL");

        let (status, body) = send(&app, get("/api/search?limit=3")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert!(body["message"].as_str().unwrap().contains("query"));
    }

    #[tokio::test]
    async fn test_market_summary_shape() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, get("/api/market/summary")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(matches!(body["market_status"].as_str(), Some("open" | "closed")));
        assert!(body["major_indices"].is_array());
        assert_eq!(body["top_gainers"][0]["symbol"], "TSLA");
    }

    #[tokio::test]
    async fn test_chat() {
        let (app, _dir) = test_app().await;

        let request = json!({
            "message": "Is AAPL a buy?",
            "symbol": "AAPL",
            "conversation_history": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello"}
            ]
        });
        let (status, body) = send(&app, with_json("POST", "/api/chat", &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "HOLD, confidence 5");
        assert_eq!(body["symbol"], "AAPL");
        assert!(body["data"].is_null());

        let (status, _) = send(&app, with_json("POST", "/api/chat", &json!({"message": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (app, _dir) = test_app().await;
        let ann = json!({"email": "ann@example.com", "name": "Ann", "password": "hunter2"});

        let (status, user) = send(&app, with_json("POST", "/api/auth/register", &ann)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["email"], "ann@example.com");
        assert!(user.get("password_hash").is_none());

        let (status, body) = send(&app, with_json("POST", "/api/auth/register", &ann)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already registered");

        let (status, body) = send(
            &app,
            with_json(
                "POST",
                "/api/auth/login",
                &json!({"email": "ann@example.com", "password": "hunter2"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["id"], user["id"]);
        assert_eq!(body["user"]["name"], "Ann");

        let (status, body) = send(
            &app,
            with_json(
                "POST",
                "/api/auth/login",
                &json!({"email": "ann@example.com", "password": "wrong"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_scheduler_lifecycle() {
        let (app, _dir) = test_app().await;
        let ann = json!({"email": "ann@example.com", "name": "Ann", "password": "hunter2"});

        let (status, user) = send(&app, with_json("POST", "/api/users", &ann)).await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = user["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, with_json("POST", "/api/users", &ann)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already registered");

        let (status, alert) = send(
            &app,
            with_json(
                "POST",
                "/api/scheduler",
                &json!({
                    "user_id": user_id,
                    "prompt": "Watch Apple",
                    "trigger_time": "morning",
                    "symbols": ["aapl"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(alert["symbols"], json!(["AAPL"]));
        assert!(alert["next_run"].is_string());
        let alert_id = alert["id"].as_str().unwrap().to_string();

        let (status, list) = send(&app, get(&format!("/api/scheduler/user/{user_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["schedulers"].as_array().unwrap().len(), 1);

        let (status, run) = send(
            &app,
            with_json("POST", &format!("/api/scheduler/{alert_id}/test"), &json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["success"], true);
        assert_eq!(run["email_sent"], false);
        assert_eq!(
            run["content"],
            "Custom Prompt: Watch Apple\n\n**AAPL**\nHOLD, confidence 5"
        );

        let (status, updated) = send(
            &app,
            with_json("PUT", &format!("/api/scheduler/{alert_id}"), &json!({"is_active": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["is_active"], false);

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/scheduler/{alert_id}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Scheduler deleted successfully");

        let (status, body) = send(&app, get(&format!("/api/scheduler/{alert_id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Scheduler not found");
    }

    #[tokio::test]
    async fn test_scheduler_requires_known_user() {
        let (app, _dir) = test_app().await;

        let request = json!({"user_id": "ghost", "prompt": "Hi", "trigger_time": "evening"});
        let (status, body) = send(&app, with_json("POST", "/api/scheduler", &request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");

        let (status, body) = send(
            &app,
            with_json("POST", "/api/scheduler/missing/test", &json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Scheduler not found");
    }

    #[tokio::test]
    async fn test_next_runs() {
        let (app, _dir) = test_app().await;
        let (status, body) = send(&app, get("/api/scheduler/next-runs")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["morning"].as_str().unwrap().contains("T08:30:00"));
        assert!(body["evening"].as_str().unwrap().contains("T17:00:00"));
    }
}
