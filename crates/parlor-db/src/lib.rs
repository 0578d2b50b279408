//! Document store adapter for the Parlor chat room.
//!
//! The chat core never talks to a database directly. It holds an
//! `Arc<dyn ChatStore>` and calls the handful of collection operations the
//! presence registry, message log, and sweeper need. Two backends
//! implement the trait:
//!
//! ```text
//! ChatStore
//!     |
//!     +-- MemoryStore   (single process, tests, local development)
//!     |
//!     +-- PostgresPool  (PostgreSQL via sqlx)
//!         |-- ParticipantStore  (participants table)
//!         +-- MessageStore      (append-only messages table)
//! ```
//!
//! Every conditional write (insert-if-absent on join, delete-if-stale on
//! sweep) is a single atomic operation in both backends.
//!
//! # Modules
//!
//! - [`store`] -- The [`ChatStore`] trait
//! - [`memory`] -- In-memory backend
//! - [`postgres`] -- `PostgreSQL` connection pool, configuration, and trait impl
//! - [`participant_store`] -- Queries on the `participants` table
//! - [`message_store`] -- Queries on the `messages` table
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod message_store;
pub mod participant_store;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryStore;
pub use message_store::{MessageRow, MessageStore};
pub use participant_store::{ParticipantRow, ParticipantStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use store::ChatStore;
