//! The collection operations the chat core depends on.

use async_trait::async_trait;
use parlor_types::{Message, Participant};

use crate::error::DbError;

/// A document store holding the `participants` and `messages` collections.
///
/// Implementations must make each method atomic on its own. Sequences of
/// calls are not transactional.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Find the participant with exactly this name.
    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, DbError>;

    /// List every registered participant in store iteration order.
    async fn list_participants(&self) -> Result<Vec<Participant>, DbError>;

    /// Insert a participant unless one with the same name already exists.
    ///
    /// Returns `false` (and writes nothing) when the name is taken.
    async fn insert_participant(&self, participant: &Participant) -> Result<bool, DbError>;

    /// Set `last_status` of the named participant.
    ///
    /// Returns `false` when no participant matched.
    async fn touch_participant(&self, name: &str, at: i64) -> Result<bool, DbError>;

    /// Delete every participant whose `last_status` is strictly before
    /// `cutoff` and return exactly the documents that were removed.
    async fn delete_stale_participants(&self, cutoff: i64) -> Result<Vec<Participant>, DbError>;

    /// Append a message to the log.
    async fn insert_message(&self, message: &Message) -> Result<(), DbError>;

    /// Return the messages visible to `user`, oldest first.
    ///
    /// See [`Message::is_visible_to`] for the visibility rule.
    async fn messages_visible_to(&self, user: &str) -> Result<Vec<Message>, DbError>;

    /// Release any held connections. The store must not be used afterwards.
    async fn close(&self) {}
}
