//! Store wrappers that fail on demand, for exercising partial-failure paths.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use super::{BlobObject, BlobStore, MemoryBlobStore, MemoryRecordStore, RecordFilter, RecordStore};
use crate::error::{AssetError, Result};
use crate::models::{ImageAsset, StyleRecord, Tier};

/// Blob store whose `copy` fails for selected source keys and whose `list`
/// fails for selected prefixes.
pub(crate) struct FlakyBlobStore {
    pub inner: MemoryBlobStore,
    pub failing_copies: HashSet<String>,
    pub failing_lists: HashSet<String>,
}

impl FlakyBlobStore {
    pub fn new(inner: MemoryBlobStore) -> Self {
        Self {
            inner,
            failing_copies: HashSet::new(),
            failing_lists: HashSet::new(),
        }
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        if self.failing_lists.contains(prefix) {
            return Err(AssetError::blob("list", format!("timed out listing {}", prefix)));
        }
        self.inner.list(prefix).await
    }

    async fn copy(&self, source_key: &str, dest_key: &str, delete_source: bool) -> Result<String> {
        if self.failing_copies.contains(source_key) {
            return Err(AssetError::blob("copy", format!("permission denied: {}", source_key)));
        }
        self.inner.copy(source_key, dest_key, delete_source).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        self.inner.key_for_url(url)
    }
}

/// Record store whose updates fail for selected record ids, either always or
/// only on the next update.
pub(crate) struct FlakyRecordStore {
    pub inner: MemoryRecordStore,
    pub failing_updates: HashSet<String>,
    pub failing_once: Mutex<HashSet<String>>,
}

impl FlakyRecordStore {
    pub fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            failing_updates: HashSet::new(),
            failing_once: Mutex::new(HashSet::new()),
        }
    }

    fn check(&self, id: &str, operation: &'static str) -> Result<()> {
        let fails_now = self.failing_once.lock().unwrap().remove(id);
        if fails_now || self.failing_updates.contains(id) {
            return Err(AssetError::record(operation, format!("connection reset for {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn find_many(&self, filter: &RecordFilter) -> Result<Vec<StyleRecord>> {
        self.inner.find_many(filter).await
    }

    async fn update_images(&self, id: &str, images: &[ImageAsset]) -> Result<()> {
        self.check(id, "update_images")?;
        self.inner.update_images(id, images).await
    }

    async fn update_tier(&self, id: &str, tier: Tier) -> Result<()> {
        self.check(id, "update_tier")?;
        self.inner.update_tier(id, tier).await
    }
}
