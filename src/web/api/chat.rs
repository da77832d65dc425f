use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::genai::{GenAiError, Reply};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub answer: String,
    /// Set when the answer is a fallback message rather than model output.
    pub degraded: bool,
}

impl From<Reply> for ChatResponse {
    fn from(reply: Reply) -> Self {
        Self {
            answer: reply.answer,
            degraded: reply.degraded,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant answer", body = ChatResponse),
        (status = 400, description = "Empty prompt", body = ErrorResponse),
        (status = 500, description = "Unexpected assistant failure", body = ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let sample = state.telemetry.current();
    let reply = state
        .assistant
        .reply(&request.prompt, sample.as_ref())
        .await
        .map_err(map_chat_error)?;
    Ok(Json(reply.into()))
}

fn map_chat_error(err: GenAiError) -> ApiError {
    match err {
        GenAiError::EmptyPrompt => ApiError::Validation("prompt must not be empty".into()),
        other => ApiError::Internal(other.to_string()),
    }
}
