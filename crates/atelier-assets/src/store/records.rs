//! Record store capability consumed by the runners.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ImageAsset, StyleRecord, Tier};

/// Selection of records for `find_many`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Only these ids.
    pub ids: Option<Vec<String>>,
    /// `Some(true)` keeps migrated records only, `Some(false)` unmigrated only.
    pub has_images: Option<bool>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_has_images(mut self, has_images: bool) -> Self {
        self.has_images = Some(has_images);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` passes the id and image predicates. The limit is not
    /// considered.
    pub fn matches(&self, record: &StyleRecord) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| id == &record.id) {
                return false;
            }
        }
        match self.has_images {
            Some(expected) => record.is_migrated() == expected,
            None => true,
        }
    }
}

/// The database holding style records.
///
/// Updates replace the whole field. Callers read the full list, modify it and
/// write it back; nothing guards against concurrent writers, so runs are
/// expected to happen offline.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records matching `filter`, ordered by id.
    async fn find_many(&self, filter: &RecordFilter) -> Result<Vec<StyleRecord>>;

    /// Replace a record's image list. Fails with `NotFound` for unknown ids.
    async fn update_images(&self, id: &str, images: &[ImageAsset]) -> Result<()>;

    /// Set a record's tier. Fails with `NotFound` for unknown ids.
    async fn update_tier(&self, id: &str, tier: Tier) -> Result<()>;
}

pub type DynRecordStore = Arc<dyn RecordStore>;
