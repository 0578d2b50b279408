//! Shared application state for the chat API.

use parlor_core::ChatService;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    /// The chat service every handler delegates to.
    pub service: ChatService,
}

impl AppState {
    /// Create application state around a built service.
    pub const fn new(service: ChatService) -> Self {
        Self { service }
    }
}
