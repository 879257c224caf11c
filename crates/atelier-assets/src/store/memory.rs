//! In-process store implementations.
//!
//! Both stores keep state behind a `tokio::sync::RwLock` and are cheap to
//! clone into tests or embedding hosts that manage their own persistence.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::blob::{validate_key, BlobObject, BlobStore, PublicUrlBase};
use super::records::{RecordFilter, RecordStore};
use crate::error::{AssetError, Result};
use crate::models::{ImageAsset, StyleRecord, Tier};

/// Blob store holding object bytes in memory.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    public_base: PublicUrlBase,
}

impl MemoryBlobStore {
    pub fn new(public_base_url: &str) -> Result<Self> {
        Ok(Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            public_base: PublicUrlBase::parse(public_base_url)?,
        })
    }

    /// Store an object under `key`, replacing any existing one.
    pub async fn put(&self, key: &str, bytes: impl Into<Vec<u8>>) -> Result<String> {
        validate_key(key)?;
        self.objects
            .write()
            .await
            .insert(key.to_string(), bytes.into());
        Ok(self.public_base.url_for(key))
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    /// All keys, in order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let objects = self.objects.read().await;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| BlobObject {
                key: key.clone(),
                url: self.public_base.url_for(key),
            })
            .collect())
    }

    async fn copy(&self, source_key: &str, dest_key: &str, delete_source: bool) -> Result<String> {
        validate_key(dest_key)?;
        let mut objects = self.objects.write().await;
        let bytes = objects.get(source_key).cloned().ok_or_else(|| {
            AssetError::blob(
                "copy",
                format!("source object does not exist: {}", source_key),
            )
        })?;

        if source_key != dest_key {
            objects.insert(dest_key.to_string(), bytes);
            if delete_source {
                objects.remove(source_key);
            }
        }
        Ok(self.public_base.url_for(dest_key))
    }

    fn public_url(&self, key: &str) -> String {
        self.public_base.url_for(key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        self.public_base.key_for(url)
    }
}

/// Record store holding style records in memory, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<BTreeMap<String, StyleRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = StyleRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, record: StyleRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Option<StyleRecord> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_many(&self, filter: &RecordFilter) -> Result<Vec<StyleRecord>> {
        let records = self.records.read().await;
        let matching = records.values().filter(|r| filter.matches(r)).cloned();
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn update_images(&self, id: &str, images: &[ImageAsset]) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| AssetError::NotFound {
            record_id: id.to_string(),
        })?;
        record.images = images.to_vec();
        Ok(())
    }

    async fn update_tier(&self, id: &str, tier: Tier) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| AssetError::NotFound {
            record_id: id.to_string(),
        })?;
        record.tier = Some(tier);
        Ok(())
    }
}
