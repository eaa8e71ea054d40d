//! The owned application context wiring the API client, place cache,
//! and session manager together.
//!
//! Construct one [`App`] per application run (or per test) instead of
//! reaching for process globals; that keeps tests isolated and lets an
//! embedder run several independent instances side by side.

use std::sync::Arc;

use anyhow::Result;

use crate::api::{ApiClient, Transport};
use crate::auth::{FileStore, SessionManager, SessionStore};
use crate::cache::PlaceCache;
use crate::config::Config;

/// The data-access core. Hand clones of this (or of its members) to the
/// presentation layer; everything inside is shared state behind cheap
/// handles.
#[derive(Clone)]
pub struct App {
    pub api: ApiClient,
    pub places: PlaceCache,
    pub session: SessionManager,
}

impl App {
    /// Wire the core against the configured API with file-backed
    /// session storage.
    pub fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStore::new(dir.clone())?),
            None => Arc::new(FileStore::default_location()?),
        };
        let api = ApiClient::new(config)?;
        Ok(Self::assemble(api, store))
    }

    /// Wire the core with an injected transport and store - the seam
    /// tests and embedders with their own persistence use.
    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self::assemble(ApiClient::with_transport(transport, config), store)
    }

    fn assemble(api: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        let places = PlaceCache::new(api.clone());
        let session = SessionManager::new(api.clone(), store);
        Self {
            api,
            places,
            session,
        }
    }

    /// Resolve any persisted session; call once at startup.
    pub async fn hydrate(&self) {
        self.session.hydrate().await;
    }

    /// End the session and drop per-user cached data with it.
    pub fn logout(&self) {
        self.session.logout();
        self.places.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
