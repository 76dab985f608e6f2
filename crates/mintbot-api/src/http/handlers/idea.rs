//! GET /api/v1/ideas - One freshly generated token idea.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use uuid::Uuid;

use mintbot_types::token::Idea;

use crate::http::auth::Authenticated;
use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

pub async fn get_idea(
    _auth: Authenticated,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Idea>>, AppError> {
    let started = Instant::now();
    let idea = state.conversations.ideas().generate().await;
    Ok(Json(ApiResponse::success(idea, Uuid::now_v7(), started)))
}
