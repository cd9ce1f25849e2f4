// src/routes/chat.rs

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    services::chat::{
        ChatError, ChatRequest, ASSISTANT_SYSTEM_PROMPT, QUOTA_MESSAGE, UNAVAILABLE_MESSAGE,
    },
    AppState,
};

pub const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Deserialize)]
pub struct ChatMessage {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Serialize)]
pub struct ChatHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub openai_available: bool,
    pub openai_model: Option<String>,
}

pub async fn chat(State(state): State<AppState>, Json(b): Json<ChatMessage>) -> ApiResult<Json<ChatResponse>> {
    let len = b.message.chars().count();
    if len == 0 || len > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "message must be between 1 and {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let req = ChatRequest {
        system: ASSISTANT_SYSTEM_PROMPT,
        user: &b.message,
        temperature: 0.7,
        max_tokens: 1000,
    };
    let response = match state.chat.complete(req).await {
        Ok(text) => text,
        Err(ChatError::NotConfigured) => UNAVAILABLE_MESSAGE.to_string(),
        Err(ChatError::QuotaExceeded) => QUOTA_MESSAGE.to_string(),
        Err(e) => return Err(ApiError::Internal(format!("Error generating response: {e}"))),
    };
    debug!(chars = response.len(), "chat reply");
    Ok(Json(ChatResponse { response }))
}

pub async fn chat_health(State(state): State<AppState>) -> Json<ChatHealth> {
    let model = state.chat.model().map(str::to_string);
    Json(ChatHealth {
        status: "healthy",
        service: "chat",
        openai_available: model.is_some(),
        openai_model: model,
    })
}
