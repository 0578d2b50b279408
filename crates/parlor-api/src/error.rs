//! Error types for the chat API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parlor_core::ChatError;
use tracing::error;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body or query is malformed. Carries every violation.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A required request header is absent or not valid text.
    #[error("missing or invalid header: {0}")]
    MissingHeader(&'static str),

    /// A chat operation failed.
    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl ApiError {
    /// The HTTP status this error is reported with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingHeader(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Chat(chat) => match chat {
                ChatError::NameTaken(_) => StatusCode::CONFLICT,
                ChatError::NotFound(_) | ChatError::InvalidSender(_) => StatusCode::NOT_FOUND,
                ChatError::Validation(_) | ChatError::InvalidLimit(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ChatError::StoreUnavailable(_) | ChatError::Clock(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let details = match &self {
            Self::Validation(details) => details.clone(),
            Self::MissingHeader(_) | Self::Chat(_) => Vec::new(),
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
            "details": details,
        });

        (status, axum::Json(body)).into_response()
    }
}
