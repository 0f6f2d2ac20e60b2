//! services/client/src/flows/state.rs
//!
//! Defines the shared application state handed to every flow.

use crate::adapters::{FileStore, HttpDocumentAdapter};
use crate::config::Config;
use crate::endpoints::Endpoints;
use crate::flows::session::SessionHandle;
use lens_core::ports::{DocumentService, KeyValueStore};
use lens_core::quota::GuestQuotaTracker;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Flows)
//=========================================================================================

/// The shared application state, created once at startup and passed to all flows.
///
/// Every collaborator is injected here; no flow looks anything up globally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub endpoints: Endpoints,
    pub documents: Arc<dyn DocumentService>,
    pub session: Arc<SessionHandle>,
    pub quota: Arc<GuestQuotaTracker>,
}

impl AppState {
    /// Wires the HTTP backend adapter and a file-backed local storage.
    ///
    /// The session starts out loading; call `SessionHandle::restore` to resolve it.
    pub fn from_config(config: Config, http: reqwest::Client) -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(config.storage_path.clone()));
        let documents = Arc::new(HttpDocumentAdapter::new(
            http,
            Endpoints::new(&config.api_base_url),
        ));
        Self::with_parts(config, documents, store)
    }

    /// Assembles the state from already-built collaborators.
    pub fn with_parts(
        config: Config,
        documents: Arc<dyn DocumentService>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let endpoints = Endpoints::new(&config.api_base_url);
        Self {
            config: Arc::new(config),
            endpoints,
            documents,
            session: Arc::new(SessionHandle::new(store.clone())),
            quota: Arc::new(GuestQuotaTracker::new(store)),
        }
    }

    pub fn is_demo_document(&self, document_id: &str) -> bool {
        document_id == self.config.demo_document_id
    }
}
