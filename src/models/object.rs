//! Represents a stored object (one uploaded image) within a container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata record for a single stored object.
///
/// The payload bytes live on disk; this struct carries everything needed to
/// serve the object back (content-type, length, etag). Object keys are
/// generated server-side per upload and are unique within their container.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct StoredObject {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Foreign key linking to the parent container.
    pub container_id: Uuid,

    /// Object key (generated token plus extension, e.g. `<uuid>.jpg`).
    pub key: String,

    /// Declared content type (MIME), passed through from the uploader.
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Hex MD5 of the payload, computed while writing.
    pub etag: String,

    /// Timestamp when the object was written (or last overwritten).
    pub created_at: DateTime<Utc>,
}
