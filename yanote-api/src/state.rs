//! Shared application state for Axum routers.

use std::sync::Arc;

use yanote_storage::Store;

use crate::auth::AuthConfig;
use crate::middleware::AuthMiddlewareState;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Notes and users. In-memory or PostgreSQL, chosen at startup.
    pub store: Arc<dyn Store>,
    pub auth_config: Arc<AuthConfig>,
    pub start_time: std::time::Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &"<Store>")
            .field("auth_config", &self.auth_config)
            .field("start_time", &self.start_time)
            .finish()
    }
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth_config: AuthConfig) -> Self {
        Self {
            store,
            auth_config: Arc::new(auth_config),
            start_time: std::time::Instant::now(),
        }
    }

    /// State for the session middleware, sharing this state's store.
    pub fn auth_middleware_state(&self) -> AuthMiddlewareState {
        AuthMiddlewareState::new(self.auth_config.clone(), self.store.clone())
    }
}

crate::impl_from_ref!(Arc<dyn Store>, store);
crate::impl_from_ref!(Arc<AuthConfig>, auth_config);
crate::impl_from_ref!(std::time::Instant, start_time);
