//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the chat store, the connection registry, and the optional push
//! sender. It is built once in `main` and cloned into every handler and
//! connection task; there is no global state.

use std::sync::Arc;

use crate::config::DEFAULT_WS_CLIENT_BUFFER;
use crate::push::PushSender;
use crate::services::registry::Registry;
use crate::services::store::ChatStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub registry: Registry,
    /// Optional push client. `None` if push env vars are not configured.
    pub push: Option<Arc<dyn PushSender>>,
    /// Outbound event queue depth per WebSocket connection.
    pub ws_client_buffer: usize,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn ChatStore>, push: Option<Arc<dyn PushSender>>) -> Self {
        Self { store, registry: Registry::new(), push, ws_client_buffer: DEFAULT_WS_CLIENT_BUFFER }
    }

    #[must_use]
    pub fn with_ws_client_buffer(mut self, buffer: usize) -> Self {
        self.ws_client_buffer = buffer.max(1);
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
