//! HTTP surface of the server: the two auth routes.

mod routes;
mod server;

use std::sync::Arc;

use graphgate_core::{GraphComponent, MemorySession, SessionStore, ValidatedConfig};

use crate::session::SessionRegistry;

pub use routes::router;
pub use server::{ServerHandle, start_server};

/// State shared by all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ValidatedConfig>,
    sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: ValidatedConfig) -> Self {
        Self::with_sessions(config, SessionRegistry::new())
    }

    /// Use a configured session registry.
    pub fn with_sessions(config: ValidatedConfig, sessions: SessionRegistry) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Build the per-request component over `session`.
    fn component(&self, session: Arc<MemorySession>) -> GraphComponent {
        GraphComponent::new(&self.config, Some(session as Arc<dyn SessionStore>))
    }
}
