//! In-memory [`ChatStore`] backend.
//!
//! Both collections live behind one [`RwLock`] as insertion-ordered
//! vectors, so iteration order is insertion order and every conditional
//! write happens under a single write guard.

use async_trait::async_trait;
use parlor_types::{Message, Participant};
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::store::ChatStore;

#[derive(Debug, Default)]
struct Collections {
    participants: Vec<Participant>,
    messages: Vec<Message>,
}

/// A process-local store. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages in the log.
    pub async fn message_count(&self) -> usize {
        self.inner.read().await.messages.len()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn find_participant(&self, name: &str) -> Result<Option<Participant>, DbError> {
        let guard = self.inner.read().await;
        Ok(guard.participants.iter().find(|p| p.name == name).cloned())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, DbError> {
        Ok(self.inner.read().await.participants.clone())
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<bool, DbError> {
        let mut guard = self.inner.write().await;
        if guard.participants.iter().any(|p| p.name == participant.name) {
            return Ok(false);
        }
        guard.participants.push(participant.clone());
        Ok(true)
    }

    async fn touch_participant(&self, name: &str, at: i64) -> Result<bool, DbError> {
        let mut guard = self.inner.write().await;
        match guard.participants.iter_mut().find(|p| p.name == name) {
            Some(participant) => {
                participant.last_status = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_stale_participants(&self, cutoff: i64) -> Result<Vec<Participant>, DbError> {
        let mut guard = self.inner.write().await;
        let (stale, fresh): (Vec<_>, Vec<_>) = guard
            .participants
            .drain(..)
            .partition(|p| p.is_stale(cutoff));
        guard.participants = fresh;
        Ok(stale)
    }

    async fn insert_message(&self, message: &Message) -> Result<(), DbError> {
        self.inner.write().await.messages.push(message.clone());
        Ok(())
    }

    async fn messages_visible_to(&self, user: &str) -> Result<Vec<Message>, DbError> {
        let guard = self.inner.read().await;
        Ok(guard
            .messages
            .iter()
            .filter(|m| m.is_visible_to(user))
            .cloned()
            .collect())
    }
}
