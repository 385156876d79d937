//! Application state containing the cache, bus, session and shared clients.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::covers::CoversClient;
use crate::session::SessionStore;
use crate::sync::ChangeBus;
use crate::sync::cache::LibraryCache;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub bus: ChangeBus,
    pub cache: Arc<LibraryCache>,
    pub session: Arc<SessionStore>,
    pub covers: CoversClient,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        let bus = ChangeBus::new();
        let cache = LibraryCache::new(db.clone(), bus.clone());
        let session = Arc::new(SessionStore::new(Arc::clone(&cache)));
        let covers = CoversClient::new(&config.openlibrary_url);

        Self {
            db,
            bus,
            cache,
            session,
            covers,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Allow extracting DatabaseConnection from AppState where a handler only
// needs the raw connection.
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
