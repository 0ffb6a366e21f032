//! HTTP handlers and the shared state they run against.

pub mod health_handlers;
pub mod object_handlers;
pub mod upload_handlers;

use crate::services::blob_service::BlobService;
use std::sync::Arc;

/// Shared application state: the storage capability plus the container every
/// upload lands in. Constructed once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub blobs: Arc<dyn BlobService>,
    pub container: String,
}
