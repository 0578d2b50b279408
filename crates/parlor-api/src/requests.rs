//! Request bodies and their validation rules.
//!
//! Bodies are deserialized leniently (plain strings) and then checked with
//! `validator`, so a caller gets every violation in one response instead of
//! only the first.

use std::borrow::Cow;

use parlor_types::MessageType;
use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

/// Body of `POST /participants`.
#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    /// Display name to register.
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
}

/// Body of `POST /messages`.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    /// Destination: the broadcast audience or a participant name.
    #[validate(length(min = 1, message = "to must not be empty"))]
    pub to: String,

    /// Message body.
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,

    /// `message` or `private_message`.
    #[serde(rename = "type")]
    #[validate(custom(function = "validate_user_message_type"))]
    pub message_type: String,
}

impl SendMessageRequest {
    /// The validated message type.
    ///
    /// Only meaningful after [`Validate::validate`] succeeded; falls back
    /// to `None` otherwise.
    pub fn parsed_type(&self) -> Option<MessageType> {
        MessageType::from_wire(&self.message_type).filter(|t| t.is_user_sendable())
    }
}

/// Query string of `GET /messages`.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    /// Raw page size. Parsed by the message log so that bad values surface
    /// as an invalid limit rather than a generic query error.
    pub limit: Option<String>,
}

fn validate_user_message_type(value: &str) -> Result<(), ValidationError> {
    match MessageType::from_wire(value) {
        Some(t) if t.is_user_sendable() => Ok(()),
        _ => Err(ValidationError::new("message_type")
            .with_message(Cow::Borrowed("type must be message or private_message"))),
    }
}

/// Flatten validation errors into `field: message` lines, sorted by field.
pub fn describe(errors: &ValidationErrors) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, problems)| {
            problems.iter().map(move |problem| {
                let reason = problem.message.as_deref().unwrap_or(&problem.code);
                format!("{field}: {reason}")
            })
        })
        .collect();
    lines.sort();
    lines
}
