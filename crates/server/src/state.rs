//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;

use crate::auth::AuthKeys;
use crate::catalog::GameCatalog;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Game template catalog.
    pub catalog: Arc<GameCatalog>,
    /// Session token keys and cookie policy.
    pub auth: Arc<AuthKeys>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, catalog: GameCatalog, auth: AuthKeys) -> Self {
        Self {
            db,
            catalog: Arc::new(catalog),
            auth: Arc::new(auth),
        }
    }
}
