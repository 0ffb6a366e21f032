//! In-memory [`BlobService`] fake for tests.
//!
//! Records every write and hands out deterministic `https://blobs.test/...`
//! URLs, so handler tests can assert on exactly what reached the backend
//! without touching disk or SQLite.

use crate::{
    models::{container::Container, object::StoredObject},
    services::blob_service::{BlobError, BlobResult, BlobService, ObjectReader},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::{
    collections::HashMap,
    io::Cursor,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    containers: HashMap<String, Container>,
    objects: HashMap<(String, String), (Bytes, Option<String>)>,
}

/// Thread-safe fake store. Clone freely; clones share the recorded state.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<Inner>>,
    /// When set, every operation fails with `StorageUnavailable`.
    unavailable: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose backend is "down": every call errors.
    pub fn unavailable() -> Self {
        Self {
            inner: Arc::default(),
            unavailable: true,
        }
    }

    /// Number of objects written so far.
    pub fn write_count(&self) -> usize {
        self.inner.lock().expect("lock").objects.len()
    }

    /// The recorded payload and content-type for one object, if written.
    pub fn recorded(&self, container: &str, key: &str) -> Option<(Bytes, Option<String>)> {
        self.inner
            .lock()
            .expect("lock")
            .objects
            .get(&(container.to_string(), key.to_string()))
            .cloned()
    }

    fn check_up(&self) -> BlobResult<()> {
        if self.unavailable {
            Err(BlobError::StorageUnavailable("backend is down".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobService for MemoryBlobStore {
    async fn ensure_container(&self, name: &str) -> BlobResult<Container> {
        self.check_up()?;
        let mut inner = self.inner.lock().expect("lock");
        let container = inner
            .containers
            .entry(name.to_string())
            .or_insert_with(|| Container {
                id: Uuid::new_v4(),
                name: name.to_string(),
                public_read: true,
                created_at: Utc::now(),
            });
        Ok(container.clone())
    }

    async fn upload(
        &self,
        container: &str,
        object_name: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> BlobResult<String> {
        self.ensure_container(container).await?;
        self.inner.lock().expect("lock").objects.insert(
            (container.to_string(), object_name.to_string()),
            (content, content_type.map(str::to_string)),
        );
        Ok(format!("https://blobs.test/{}/{}", container, object_name))
    }

    async fn open_object(
        &self,
        container: &str,
        key: &str,
    ) -> BlobResult<(StoredObject, ObjectReader)> {
        self.check_up()?;
        let inner = self.inner.lock().expect("lock");
        let container_rec = inner
            .containers
            .get(container)
            .ok_or_else(|| BlobError::ObjectNotFound {
                container: container.to_string(),
                key: key.to_string(),
            })?;
        let (content, content_type) = inner
            .objects
            .get(&(container.to_string(), key.to_string()))
            .ok_or_else(|| BlobError::ObjectNotFound {
                container: container.to_string(),
                key: key.to_string(),
            })?;

        let meta = StoredObject {
            id: Uuid::new_v4(),
            container_id: container_rec.id,
            key: key.to_string(),
            content_type: content_type.clone(),
            size_bytes: content.len() as i64,
            etag: format!("{:x}", md5::compute(content)),
            created_at: Utc::now(),
        };
        let reader = Box::new(Cursor::new(content.to_vec())) as ObjectReader;
        Ok((meta, reader))
    }
}
