//! Chat API
//!
//! Relays one user message to the completion provider and returns its reply.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

/// Chat request body
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's reply
    pub reply: String,
}

/// POST /api/chat - Relay a message to the assistant
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))?;

    let reply = state.chat.relay(request.message.as_deref()).await?;

    Ok(Json(ChatResponse { reply }))
}
