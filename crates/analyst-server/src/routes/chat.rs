//! Conversational analysis

use analyst_chat::ChatReply;
use analyst_llm::Message;
use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// One prior turn supplied by the client
#[derive(Debug, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }

    let history = req
        .conversation_history
        .into_iter()
        .map(history_turn)
        .collect::<Result<Vec<_>, _>>()?;

    let reply = state
        .orchestrator
        .chat(message, req.symbol.as_deref(), history)
        .await;
    Ok(Json(reply))
}

fn history_turn(turn: HistoryMessage) -> Result<Message, ApiError> {
    match turn.role.as_str() {
        "user" => Ok(Message::user(turn.content)),
        "assistant" => Ok(Message::assistant(turn.content)),
        "system" => Ok(Message::system(turn.content)),
        other => Err(ApiError::BadRequest(format!(
            "Unsupported conversation role: {other}"
        ))),
    }
}
