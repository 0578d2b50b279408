//! HTTP API for the Parlor chat room.
//!
//! This crate provides an Axum HTTP server that exposes the chat core:
//!
//! - **Presence** (`/participants`, `/status`) for joining, listing, and
//!   heartbeats
//! - **Messages** (`/messages`) for posting and reading the log as seen by
//!   the caller
//!
//! The caller identifies itself with the `User` header. Request bodies are
//! validated with `validator` before they reach the core, and every failure
//! is rendered as a JSON body by [`ApiError`].
//!
//! [`ApiError`]: error::ApiError

pub mod error;
pub mod handlers;
pub mod requests;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
