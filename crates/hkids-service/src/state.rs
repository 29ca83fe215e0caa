//! Application state.

use std::sync::Arc;

use hkids_store::Store;

use crate::config::ServiceConfig;
use crate::ingest::IngestQueue;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Queue feeding the page-ingestion worker.
    pub ingest: IngestQueue,
}

impl AppState {
    /// Create a new application state and start the ingestion worker.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let ingest = IngestQueue::start(Arc::clone(&store));
        Self {
            store,
            config,
            ingest,
        }
    }
}
