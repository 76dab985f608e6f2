//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/conversations/{id}/messages - Feed one input, get the replies
//! - GET  /api/v1/conversations/{id}          - Current session state, if any
//!
//! The conversation id plays the role of a Telegram chat id, so the same
//! state machine and per-conversation ordering apply.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mintbot_core::reply::{Reply, ReplyBuffer};
use mintbot_core::session::Input;
use mintbot_types::session::{ConversationId, SessionState};
use mintbot_types::token::ImageReference;

use crate::http::auth::Authenticated;
use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::{AppState, Inbound, Outbox};

/// Request body for posting a message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageRequest {
    Text { text: String },
    Image { url: String },
}

impl MessageRequest {
    fn into_input(self) -> Result<Input, AppError> {
        match self {
            MessageRequest::Text { text } => Ok(Input::Text(text)),
            MessageRequest::Image { url } => {
                let url = url.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(AppError::Validation(
                        "Image url must be an http(s) URL".to_string(),
                    ));
                }
                Ok(Input::Image(ImageReference::new(url.to_string())))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub replies: Vec<Reply>,
    /// State after the input was handled; `None` when no session is active.
    pub state: Option<SessionState>,
}

/// Session snapshot. Collected field values are not exposed.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

fn parse_id(raw: &str) -> Result<ConversationId, AppError> {
    raw.parse::<i64>()
        .map(ConversationId)
        .map_err(|_| AppError::Validation(format!("Invalid conversation id: {raw}")))
}

/// POST /api/v1/conversations/{id}/messages
pub async fn post_message(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let started = Instant::now();
    let id = parse_id(&id)?;
    let input = request.into_input()?;

    let buffer = Arc::new(ReplyBuffer::new());
    state
        .dispatcher
        .dispatch_and_wait(id, Inbound::Input(input), Outbox::Buffer(Arc::clone(&buffer)))
        .await?;

    let session = state.conversations.store().get(id).await;
    let response = MessageResponse {
        replies: buffer.drain(),
        state: session.map(|s| s.state),
    };
    Ok(Json(ApiResponse::success(response, Uuid::now_v7(), started)))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Option<ConversationView>>>, AppError> {
    let started = Instant::now();
    let id = parse_id(&id)?;

    let view = state
        .conversations
        .store()
        .get(id)
        .await
        .map(|session| ConversationView {
            state: session.state,
            created_at: session.created_at,
            last_activity: session.last_activity,
        });
    Ok(Json(ApiResponse::success(view, Uuid::now_v7(), started)))
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use mintbot_infra::config::resolve;
    use mintbot_types::config::ConfigFile;

    use super::*;

    fn state() -> AppState {
        let config = resolve(ConfigFile::default(), |_| None).unwrap();
        AppState::init(config, CancellationToken::new())
    }

    async fn post(state: &AppState, id: &str, text: &str) -> MessageResponse {
        let Json(response) = post_message(
            Authenticated,
            State(state.clone()),
            Path(id.to_string()),
            Json(MessageRequest::Text {
                text: text.to_string(),
            }),
        )
        .await
        .unwrap();
        response.data
    }

    #[tokio::test]
    async fn test_help_returns_reply_without_session() {
        let state = state();
        let response = post(&state, "1", "/help").await;
        assert_eq!(response.replies.len(), 1);
        assert!(response.state.is_none());
        state.cancel.cancel();
    }

    #[tokio::test]
    async fn test_create_then_name_advances_state() {
        let state = state();
        let response = post(&state, "2", "/create").await;
        assert_eq!(response.state, Some(SessionState::CollectingName));
        assert!(!response.replies.is_empty());

        let response = post(&state, "2", "Moon Cat").await;
        assert_eq!(response.state, Some(SessionState::CollectingSymbol));

        let Json(view) = get_conversation(Authenticated, State(state.clone()), Path("2".to_string()))
            .await
            .unwrap();
        assert_eq!(view.data.unwrap().state, SessionState::CollectingSymbol);

        let response = post(&state, "2", "/cancel").await;
        assert!(response.state.is_none());
        state.cancel.cancel();
    }

    #[tokio::test]
    async fn test_conversations_are_independent() {
        let state = state();
        post(&state, "3", "/create").await;
        let Json(view) = get_conversation(Authenticated, State(state.clone()), Path("4".to_string()))
            .await
            .unwrap();
        assert!(view.data.is_none());
        state.cancel.cancel();
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected() {
        let state = state();
        let result = get_conversation(Authenticated, State(state.clone()), Path("abc".to_string())).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        state.cancel.cancel();
    }

    #[test]
    fn test_message_request_parsing() {
        let text: MessageRequest = serde_json::from_str(r#"{"type":"text","text":"hi"}"#).unwrap();
        assert!(matches!(text.into_input(), Ok(Input::Text(t)) if t == "hi"));

        let image: MessageRequest =
            serde_json::from_str(r#"{"type":"image","url":"https://img.example/cat.png"}"#).unwrap();
        assert!(matches!(image.into_input(), Ok(Input::Image(_))));

        let bad: MessageRequest = serde_json::from_str(r#"{"type":"image","url":"ftp://x"}"#).unwrap();
        assert!(matches!(bad.into_input(), Err(AppError::Validation(_))));
    }
}
