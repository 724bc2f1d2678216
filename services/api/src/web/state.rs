//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::stores::{ClientStore, CompanyStore, InspectionStore, UserStore};
use firesafe_core::ports::{DataStore, FileStore, Notifier};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Handlers go through the entity stores for everything cacheable; the raw
/// `db` port is reserved for auth flows, which bypass the cache.
pub struct AppState {
    pub db: Arc<dyn DataStore>,
    pub clients: ClientStore,
    pub inspections: InspectionStore,
    pub company: CompanyStore,
    pub users: UserStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DataStore>,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn Notifier>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            clients: ClientStore::new(Arc::clone(&db), Arc::clone(&notifier)),
            inspections: InspectionStore::new(
                Arc::clone(&db),
                Arc::clone(&files),
                Arc::clone(&notifier),
            ),
            company: CompanyStore::new(Arc::clone(&db), Arc::clone(&files), Arc::clone(&notifier)),
            users: UserStore::new(Arc::clone(&db), notifier),
            db,
            config,
        }
    }
}
