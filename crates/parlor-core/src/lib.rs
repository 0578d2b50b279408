//! Presence, messaging, and inactivity sweeping for the Parlor chat room.
//!
//! This crate owns the rules of the room: who is present, what they may
//! read, and when a silent participant is evicted. It talks to storage only
//! through [`parlor_db::ChatStore`] and to time only through
//! [`clock::Clock`], so every rule can be exercised against an in-memory
//! store and a manual clock.
//!
//! # Modules
//!
//! - [`clock`] -- The [`Clock`](clock::Clock) seam with system and manual
//!   implementations.
//! - [`config`] -- Configuration loading from `parlor-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`ChatError`](error::ChatError).
//! - [`presence`] -- Join, heartbeat, and listing of participants.
//! - [`message_log`] -- Appending and audience-filtered reading.
//! - [`sweeper`] -- Periodic eviction of stale participants.
//! - [`service`] -- [`ChatService`](service::ChatService), the explicitly
//!   constructed owner of all of the above.

pub mod clock;
pub mod config;
pub mod error;
pub mod message_log;
pub mod presence;
pub mod service;
pub mod sweeper;

pub use clock::{Clock, ClockError, ManualClock, SystemClock};
pub use config::{ChatConfig, ConfigError, PresenceConfig, StorageBackend};
pub use error::ChatError;
pub use message_log::MessageLog;
pub use presence::PresenceRegistry;
pub use service::ChatService;
pub use sweeper::{SweepReport, Sweeper, SweeperHandle};
