//! Axum router construction for the chat API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for browser clients served from another origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the chat server.
///
/// The router includes:
/// - `POST /participants` -- join
/// - `GET /participants` -- list participants
/// - `POST /messages` -- post a message
/// - `GET /messages` -- read the caller's view of the log
/// - `POST /status` -- heartbeat
///
/// CORS allows any origin, method, and header.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/participants",
            post(handlers::join).get(handlers::list_participants),
        )
        .route(
            "/messages",
            post(handlers::send_message).get(handlers::list_messages),
        )
        .route("/status", post(handlers::heartbeat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
