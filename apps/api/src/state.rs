use std::sync::Arc;

use crate::config::Config;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Live search sessions, each bound to the searcher and recommender
    /// chosen at startup.
    pub sessions: Arc<SessionStore>,
    pub config: Config,
}
