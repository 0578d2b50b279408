//! The chat service: one explicitly constructed owner for the store, the
//! clock, and the three components built on them.
//!
//! The process opens the store at start, builds a [`ChatService`], hands
//! it to the HTTP layer, and calls [`ChatService::close`] at shutdown.

use std::num::NonZeroUsize;
use std::sync::Arc;

use parlor_db::ChatStore;
use parlor_types::{Message, MessageType, Participant};

use crate::clock::Clock;
use crate::config::{ConfigError, PresenceConfig};
use crate::error::ChatError;
use crate::message_log::MessageLog;
use crate::presence::PresenceRegistry;
use crate::sweeper::{SweepReport, Sweeper, SweeperHandle};

/// Presence registry, message log, and sweeper sharing one store.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    registry: PresenceRegistry,
    log: MessageLog,
    sweeper: Sweeper,
}

impl ChatService {
    /// Build the service over an open store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `presence` is not usable.
    pub fn new(
        store: Arc<dyn ChatStore>,
        clock: Arc<dyn Clock>,
        presence: &PresenceConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            registry: PresenceRegistry::new(Arc::clone(&store), Arc::clone(&clock)),
            log: MessageLog::new(Arc::clone(&store), Arc::clone(&clock)),
            sweeper: Sweeper::new(Arc::clone(&store), clock, presence)?,
            store,
        })
    }

    /// See [`PresenceRegistry::join`].
    pub async fn join(&self, name: &str) -> Result<Participant, ChatError> {
        self.registry.join(name).await
    }

    /// See [`PresenceRegistry::heartbeat`].
    pub async fn heartbeat(&self, name: &str) -> Result<(), ChatError> {
        self.registry.heartbeat(name).await
    }

    /// See [`PresenceRegistry::list`].
    pub async fn participants(&self) -> Result<Vec<Participant>, ChatError> {
        self.registry.list().await
    }

    /// See [`MessageLog::append`].
    pub async fn send(
        &self,
        from: &str,
        to: &str,
        text: &str,
        message_type: MessageType,
    ) -> Result<Message, ChatError> {
        self.log.append(from, to, text, message_type).await
    }

    /// See [`MessageLog::list_for`].
    pub async fn messages_for(
        &self,
        user: &str,
        limit: Option<NonZeroUsize>,
    ) -> Result<Vec<Message>, ChatError> {
        self.log.list_for(user, limit).await
    }

    /// Run one sweep now. See [`Sweeper::sweep_once`].
    pub async fn sweep_once(&self) -> Result<SweepReport, ChatError> {
        self.sweeper.sweep_once().await
    }

    /// Start the periodic sweep. See [`Sweeper::spawn`].
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        self.sweeper.spawn()
    }

    /// Release the store. Call once, after the sweeper and the HTTP server
    /// have stopped.
    pub async fn close(&self) {
        self.store.close().await;
    }
}
