//! Represents a container — the named grouping that holds uploaded objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A storage container (bucket-like namespace for objects).
///
/// Containers are created lazily on first reference and never deleted by the
/// service. Objects written into a container with `public_read` set are
/// retrievable by anyone holding the returned URL.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Container {
    /// Unique identifier for this container (UUID for internal DB use).
    pub id: Uuid,

    /// Container name; must conform to the backend's naming charset.
    pub name: String,

    /// Whether contained objects are readable without authentication.
    pub public_read: bool,

    /// When this container was first created.
    pub created_at: DateTime<Utc>,
}
