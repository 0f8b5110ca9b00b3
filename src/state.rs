use std::sync::Arc;

use crate::configuration::{Platform, Settings};
use crate::middleware::FileServerHits;
use crate::session::SessionService;
use crate::store::Store;

/// Shared, immutable-after-startup context handed to every handler
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionService,
    pub platform: Platform,
    pub file_server_hits: FileServerHits,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, settings: &Settings) -> Self {
        let sessions = SessionService::new(store.clone(), settings.jwt(), settings.polka_key.clone());

        Self {
            store,
            sessions,
            platform: settings.platform,
            file_server_hits: FileServerHits::default(),
        }
    }
}
