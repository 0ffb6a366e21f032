//! The storage capability boundary.
//!
//! `BlobService` is what the HTTP layer programs against: create-if-absent
//! containers, whole-object uploads that hand back a public URL, and the read
//! path that makes those URLs resolvable. The real adapter is
//! [`FsBlobStore`](crate::services::fs_blob_store::FsBlobStore); tests use an
//! in-memory fake.

use crate::models::{container::Container, object::StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;
use tokio::io::AsyncRead;

#[derive(Debug, Error)]
pub enum BlobError {
    /// No usable payload: missing file part, or the part could not be read.
    #[error("invalid content: {0}")]
    InvalidContent(String),
    /// Backend failure: store unreachable, container name rejected by
    /// validation, quota or permission problems.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("object `{key}` not found in container `{container}`")]
    ObjectNotFound { container: String, key: String },
    #[error("invalid object key")]
    InvalidObjectKey,
}

impl From<sqlx::Error> for BlobError {
    fn from(err: sqlx::Error) -> Self {
        BlobError::StorageUnavailable(err.to_string())
    }
}

impl From<io::Error> for BlobError {
    fn from(err: io::Error) -> Self {
        BlobError::StorageUnavailable(err.to_string())
    }
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Boxed async reader handed out when streaming a payload back to a client.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Two-operation contract between the upload handler and the object store,
/// plus the read side used by the public serving route.
#[async_trait]
pub trait BlobService: Send + Sync {
    /// Create the container if it does not exist, with public read access
    /// for its objects; return a handle either way. Idempotent and safe
    /// under concurrent first calls. Failures are not retried here.
    async fn ensure_container(&self, name: &str) -> BlobResult<Container>;

    /// Write `content` under `object_name` in `container` (resolving the
    /// container via [`ensure_container`](Self::ensure_container) first) and
    /// return the absolute URL of the stored object. Whole-object semantics;
    /// re-using an object name overwrites (last writer wins) — callers that
    /// need no-overwrite must generate unique names.
    async fn upload(
        &self,
        container: &str,
        object_name: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> BlobResult<String>;

    /// Fetch metadata and a reader for a stored object.
    async fn open_object(
        &self,
        container: &str,
        key: &str,
    ) -> BlobResult<(StoredObject, ObjectReader)>;
}
