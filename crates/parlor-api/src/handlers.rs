//! REST API endpoint handlers for the chat room.
//!
//! Every handler validates its input, delegates to the
//! [`ChatService`](parlor_core::ChatService) in [`AppState`], and maps
//! failures through [`ApiError`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/participants` | Join the room |
//! | `GET` | `/participants` | List active participants |
//! | `POST` | `/messages` | Post a message as the `User` header |
//! | `GET` | `/messages` | Read the log visible to the `User` header |
//! | `POST` | `/status` | Heartbeat for the `User` header |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use parlor_core::MessageLog;
use parlor_types::{Message, Participant};
use validator::Validate;

use crate::error::ApiError;
use crate::requests::{self, JoinRequest, MessagesQuery, SendMessageRequest};
use crate::state::AppState;

/// Header naming the calling participant.
pub const USER_HEADER: &str = "User";

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

/// The calling participant. Names are UTF-8, so the raw header bytes are
/// decoded as UTF-8 rather than restricted to visible ASCII.
fn caller(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
        .filter(|name| !name.is_empty())
        .ok_or(ApiError::MissingHeader(USER_HEADER))
}

fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::Validation(vec![e.body_text()]))?;
    body.validate()
        .map_err(|e| ApiError::Validation(requests::describe(&e)))?;
    Ok(body)
}

// ---------------------------------------------------------------------------
// /participants
// ---------------------------------------------------------------------------

/// Join the room under the requested name.
pub async fn join(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let request = validated(payload)?;
    state.service.join(&request.name).await?;
    Ok(StatusCode::CREATED)
}

/// List every active participant.
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    Ok(Json(state.service.participants().await?))
}

// ---------------------------------------------------------------------------
// /messages
// ---------------------------------------------------------------------------

/// Post a message from the caller.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let from = caller(&headers)?;
    let request = validated(payload)?;
    let message_type = request.parsed_type().ok_or_else(|| {
        ApiError::Validation(vec![
            "type: type must be message or private_message".to_owned(),
        ])
    })?;

    state
        .service
        .send(from, &request.to, &request.text, message_type)
        .await?;
    Ok(StatusCode::CREATED)
}

/// Read the messages visible to the caller.
///
/// With `?limit=N` only the newest `N` messages come back, newest first.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let user = caller(&headers)?;
    let Query(query) = query.map_err(|e| ApiError::Validation(vec![e.body_text()]))?;
    let limit = MessageLog::parse_limit(query.limit.as_deref())?;

    Ok(Json(state.service.messages_for(user, limit).await?))
}

// ---------------------------------------------------------------------------
// /status
// ---------------------------------------------------------------------------

/// Refresh the caller's heartbeat.
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = caller(&headers)?;
    state.service.heartbeat(user).await?;
    Ok(StatusCode::OK)
}
