//! Chat Route
//!
//! - POST /api/v1/chat - Ask the health companion a question

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{ChatRequest, ChatResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::JsonBody;
use crate::api::state::AppState;

/// Longest accepted chat message, in characters
pub const MAX_MESSAGE_LEN: usize = 2000;

/// POST /api/v1/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::Validation("Message cannot be empty".to_string()));
    }

    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::Validation(format!(
            "Message exceeds maximum length of {} characters",
            MAX_MESSAGE_LEN
        )));
    }

    let response = state.agent.chat(req.username.trim(), message).await?;
    Ok(Json(ChatResponse { response }))
}
