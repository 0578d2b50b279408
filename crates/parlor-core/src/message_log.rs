//! Append-only message log with audience filtering on read.

use std::num::NonZeroUsize;
use std::sync::Arc;

use parlor_db::ChatStore;
use parlor_types::{Message, MessageType};
use tracing::debug;

use crate::clock::Clock;
use crate::error::ChatError;

/// Writes user messages and reads the log as seen by one participant.
#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
}

impl MessageLog {
    /// Create a log over the given store and clock.
    pub const fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Append a user message, stamped with the current time.
    ///
    /// Only [`MessageType::Message`] and [`MessageType::PrivateMessage`]
    /// may be sent this way; status entries are written by the registry
    /// and the sweeper.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Validation`] for a status type,
    /// [`ChatError::InvalidSender`] if `from` is not an active participant,
    /// or [`ChatError::StoreUnavailable`] on store failure.
    pub async fn append(
        &self,
        from: &str,
        to: &str,
        text: &str,
        message_type: MessageType,
    ) -> Result<Message, ChatError> {
        if !message_type.is_user_sendable() {
            return Err(ChatError::Validation(format!(
                "type must be message or private_message, got {message_type}"
            )));
        }
        if self.store.find_participant(from).await?.is_none() {
            return Err(ChatError::InvalidSender(from.to_owned()));
        }

        let time = self.clock.format_time(self.clock.now_millis())?;
        let message = Message::new(from, to, text, message_type, time);
        self.store.insert_message(&message).await?;

        debug!(from, to, message_type = %message_type, "Message appended");
        Ok(message)
    }

    /// The messages `user` may read.
    ///
    /// Without a limit the whole visible log comes back oldest first. With
    /// a limit only the newest `limit` entries come back, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StoreUnavailable`] on store failure.
    pub async fn list_for(
        &self,
        user: &str,
        limit: Option<NonZeroUsize>,
    ) -> Result<Vec<Message>, ChatError> {
        let mut visible = self.store.messages_visible_to(user).await?;
        let Some(limit) = limit else {
            return Ok(visible);
        };
        let mut newest = visible.split_off(visible.len().saturating_sub(limit.get()));
        newest.reverse();
        Ok(newest)
    }

    /// Parse the raw `limit` query value.
    ///
    /// An absent value means "no limit". Anything that is not a positive
    /// integer is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidLimit`] for non-numeric, zero, or
    /// negative input.
    pub fn parse_limit(raw: Option<&str>) -> Result<Option<NonZeroUsize>, ChatError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        raw.trim()
            .parse::<NonZeroUsize>()
            .map(Some)
            .map_err(|e| ChatError::InvalidLimit(format!("{raw:?}: {e}")))
    }
}
