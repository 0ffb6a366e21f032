//! Disk-backed [`BlobService`] adapter.
//!
//! Object payloads live on local disk beneath
//! `base_path/{container}/{shard}/{shard}/{key}`; metadata (content-type,
//! size, etag) lives in SQLite. Returned URLs point at the public base URL
//! configured at startup, where the serving route resolves them.

use crate::{
    models::{container::Container, object::StoredObject},
    services::blob_service::{BlobError, BlobResult, BlobService, ObjectReader},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use sqlx::SqlitePool;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use uuid::Uuid;

const MAX_OBJECT_KEY_LEN: usize = 1024;
const CONTAINER_NAME_MIN_LEN: usize = 3;
const CONTAINER_NAME_MAX_LEN: usize = 63;

/// Real storage adapter: SQLite metadata plus on-disk payloads.
///
/// Cheap to clone; the pool is shared and every method is safe to call from
/// concurrent in-flight requests.
#[derive(Clone)]
pub struct FsBlobStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where object payloads are stored.
    pub base_path: PathBuf,

    /// Base URL under which stored objects are publicly retrievable,
    /// without a trailing slash.
    public_base_url: String,
}

impl FsBlobStore {
    /// Create a new store over the provided pool, payload directory, and
    /// public base URL.
    pub fn new(
        db: Arc<SqlitePool>,
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            db,
            base_path: base_path.into(),
            public_base_url,
        }
    }

    /// Absolute URL at which an object will be retrievable after upload.
    fn object_url(&self, container: &str, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, container, key)
    }

    /// Basic key validation to avoid trivial path traversal vectors.
    ///
    /// Upload keys are generated server-side, but the serving route accepts
    /// arbitrary request paths, so both go through this check.
    fn ensure_key_safe(&self, key: &str) -> BlobResult<()> {
        if key.is_empty() || key.len() > MAX_OBJECT_KEY_LEN {
            return Err(BlobError::InvalidObjectKey);
        }
        if key.starts_with('/') || key.contains("..") {
            return Err(BlobError::InvalidObjectKey);
        }
        if key
            .bytes()
            .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
        {
            return Err(BlobError::InvalidObjectKey);
        }
        Ok(())
    }

    /// Validate container name format.
    ///
    /// Enforces bucket-like naming rules:
    /// - 3–63 characters
    /// - lowercase letters, digits, dots, hyphens only
    /// - must start and end with a letter or digit
    /// - no consecutive dots
    ///
    /// Rejections surface as `StorageUnavailable`: the name is part of the
    /// backend's validation contract, not of the uploaded content.
    fn ensure_container_name_safe(&self, name: &str) -> BlobResult<()> {
        let reject = |reason: &str| {
            Err(BlobError::StorageUnavailable(format!(
                "container name `{}` rejected: {}",
                name, reason
            )))
        };

        let len = name.len();
        if len < CONTAINER_NAME_MIN_LEN || len > CONTAINER_NAME_MAX_LEN {
            return reject("must be between 3 and 63 characters");
        }
        if !name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
        {
            return reject("allowed characters are lowercase letters, digits, dots, and hyphens");
        }
        if name.starts_with('.')
            || name.ends_with('.')
            || name.starts_with('-')
            || name.ends_with('-')
        {
            return reject("must start and end with a lowercase letter or digit");
        }
        if name.contains("..") {
            return reject("cannot contain consecutive dots");
        }
        Ok(())
    }

    /// Physical base folder for a container. Does not check existence.
    fn container_root(&self, container: &str) -> PathBuf {
        let mut path = self.base_path.clone();
        path.push(container);
        path
    }

    /// Two-level shard identifiers for an object key.
    ///
    /// First two bytes of MD5(container/key) as lowercase hex (00–ff);
    /// keeps the per-directory file count down.
    fn object_shards(container: &str, key: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", container, key));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Fully-qualified payload path: base/container/{shard}/{shard}/{key}.
    /// Parent directories may not exist yet.
    fn object_path(&self, container: &str, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::object_shards(container, key);
        let mut path = self.container_root(container);
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    /// Fetch a container row by name; `ObjectNotFound` is mapped by callers
    /// on the read path, so this keeps the raw not-found distinction.
    async fn fetch_container(&self, name: &str) -> Result<Option<Container>, sqlx::Error> {
        sqlx::query_as::<_, Container>(
            "SELECT id, name, public_read, created_at FROM containers WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&*self.db)
        .await
    }
}

#[async_trait]
impl BlobService for FsBlobStore {
    /// Create-if-absent, with public read access for contained objects.
    ///
    /// Concurrent first calls race benignly: the directory create and the
    /// `ON CONFLICT DO NOTHING` insert are both idempotent, and every caller
    /// re-reads the surviving row afterwards.
    async fn ensure_container(&self, name: &str) -> BlobResult<Container> {
        self.ensure_container_name_safe(name)?;
        fs::create_dir_all(self.container_root(name)).await?;

        sqlx::query(
            "INSERT INTO containers (id, name, public_read, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(true)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        self.fetch_container(name).await?.ok_or_else(|| {
            BlobError::StorageUnavailable(format!("container `{}` vanished after create", name))
        })
    }

    /// Write the whole payload to a temporary file, fsync, rename into
    /// place, then upsert the metadata row (overwrite semantics on key
    /// reuse). Temp files are cleaned up on every failure path.
    async fn upload(
        &self,
        container: &str,
        object_name: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> BlobResult<String> {
        self.ensure_key_safe(object_name)?;
        let container_rec = self.ensure_container(container).await?;

        let file_path = self.object_path(container, object_name);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            BlobError::StorageUnavailable("object path missing parent directory".into())
        })?;
        fs::create_dir_all(&parent).await?;

        let etag = format!("{:x}", md5::compute(&content));
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let write_result = async {
            file.write_all(&content).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        if let Err(err) = write_result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::from(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobError::from(err));
            }
        }

        let insert_result = sqlx::query(
            "INSERT INTO objects (
                 id, container_id, key, content_type, size_bytes, etag, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(container_id, key) DO UPDATE SET
                 content_type = excluded.content_type,
                 size_bytes = excluded.size_bytes,
                 etag = excluded.etag,
                 created_at = excluded.created_at",
        )
        .bind(Uuid::new_v4())
        .bind(container_rec.id)
        .bind(object_name)
        .bind(content_type)
        .bind(content.len() as i64)
        .bind(&etag)
        .bind(Utc::now())
        .execute(&*self.db)
        .await;

        if let Err(err) = insert_result {
            let _ = fs::remove_file(&file_path).await;
            return Err(BlobError::from(err));
        }

        tracing::debug!(
            container,
            key = object_name,
            size = content.len(),
            %etag,
            "stored object"
        );
        Ok(self.object_url(container, object_name))
    }

    /// Metadata plus an opened file handle ready for streaming out.
    async fn open_object(
        &self,
        container: &str,
        key: &str,
    ) -> BlobResult<(StoredObject, ObjectReader)> {
        self.ensure_key_safe(key)?;
        let not_found = || BlobError::ObjectNotFound {
            container: container.to_string(),
            key: key.to_string(),
        };

        let container_rec = self
            .fetch_container(container)
            .await
            .map_err(BlobError::from)?
            .ok_or_else(not_found)?;

        let object = sqlx::query_as::<_, StoredObject>(
            "SELECT id, container_id, key, content_type, size_bytes, etag, created_at
             FROM objects WHERE container_id = ? AND key = ?",
        )
        .bind(container_rec.id)
        .bind(key)
        .fetch_optional(&*self.db)
        .await
        .map_err(BlobError::from)?
        .ok_or_else(not_found)?;

        let file_path = self.object_path(container, key);
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                not_found()
            } else {
                BlobError::from(err)
            }
        })?;

        Ok((object, Box::new(file) as ObjectReader))
    }
}
