use std::sync::Arc;

use crate::records::RecordStore;
use crate::services::Services;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub records: Arc<RecordStore>,
}
