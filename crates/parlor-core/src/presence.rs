//! Presence registry: who is in the room and when they last checked in.
//!
//! A participant moves `ABSENT -> ACTIVE` on [`PresenceRegistry::join`],
//! stays `ACTIVE` on every [`PresenceRegistry::heartbeat`], and goes back
//! to `ABSENT` only when the [`Sweeper`](crate::sweeper::Sweeper) evicts
//! it. Re-joining after eviction creates a brand-new identity.

use std::sync::Arc;

use parlor_db::ChatStore;
use parlor_types::{JOIN_STATUS_TEXT, Message, Participant};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::ChatError;

/// Tracks active participants and their last heartbeat.
#[derive(Clone)]
pub struct PresenceRegistry {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
}

impl PresenceRegistry {
    /// Create a registry over the given store and clock.
    pub const fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Register `name` and announce it to the room.
    ///
    /// The uniqueness check and the insert are a single conditional write,
    /// so concurrent joins with the same name admit exactly one. The join
    /// status message is written after the insert; if that write fails the
    /// participant stays registered.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NameTaken`] if an active participant already
    /// uses `name`, or [`ChatError::StoreUnavailable`] on store failure.
    pub async fn join(&self, name: &str) -> Result<Participant, ChatError> {
        let now = self.clock.now_millis();
        let time = self.clock.format_time(now)?;
        let participant = Participant::new(name, now);

        if !self.store.insert_participant(&participant).await? {
            debug!(name, "Join rejected, name taken");
            return Err(ChatError::NameTaken(name.to_owned()));
        }

        self.store
            .insert_message(&Message::status(name, JOIN_STATUS_TEXT, time))
            .await?;

        info!(name, participant_id = %participant.id, "Participant joined");
        Ok(participant)
    }

    /// Refresh the heartbeat of `name` to now.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NotFound`] if `name` is not active, or
    /// [`ChatError::StoreUnavailable`] on store failure.
    pub async fn heartbeat(&self, name: &str) -> Result<(), ChatError> {
        let now = self.clock.now_millis();
        if !self.store.touch_participant(name, now).await? {
            return Err(ChatError::NotFound(name.to_owned()));
        }
        debug!(name, at = now, "Heartbeat");
        Ok(())
    }

    /// Every registered participant, in store iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StoreUnavailable`] on store failure.
    pub async fn list(&self) -> Result<Vec<Participant>, ChatError> {
        Ok(self.store.list_participants().await?)
    }
}
