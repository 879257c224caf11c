//! Set difference between a record's namespace in the blob store and the
//! image URLs recorded on it.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::Result;
use crate::models::StyleRecord;
use crate::store::{is_direct_child, BlobObject, DynBlobStore};

/// Both directions of a record's reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileDiff {
    pub record_id: String,
    /// Objects at `{recordId}/{filename}` whose URL is not on the record, in
    /// listing order.
    pub missing_from_record: Vec<BlobObject>,
    /// URLs on the record that the namespace listing does not contain.
    pub recorded_but_absent: Vec<String>,
    /// Objects nested below the namespace (`{recordId}/{label}/...`). These
    /// carry room-type associations that are never reconstructed.
    pub room_scoped: Vec<BlobObject>,
}

impl ReconcileDiff {
    pub fn is_clean(&self) -> bool {
        self.missing_from_record.is_empty() && self.recorded_but_absent.is_empty()
    }
}

/// Computes [`ReconcileDiff`]s against a blob store.
pub struct Reconciler {
    blobs: DynBlobStore,
}

impl Reconciler {
    pub fn new(blobs: DynBlobStore) -> Self {
        Self { blobs }
    }

    /// List the record's namespace and diff it against the record.
    pub async fn diff(&self, record: &StyleRecord) -> Result<ReconcileDiff> {
        let listing = self.blobs.list(&record.namespace_prefix()).await?;
        Ok(Self::diff_listing(record, &listing))
    }

    /// Diff an already fetched namespace listing against the record.
    ///
    /// URLs are compared by string equality only.
    pub fn diff_listing(record: &StyleRecord, listing: &[BlobObject]) -> ReconcileDiff {
        let prefix = record.namespace_prefix();
        let recorded: HashSet<&str> = record
            .images
            .iter()
            .map(|img| img.public_url.as_str())
            .collect();
        let listed: HashSet<&str> = listing.iter().map(|obj| obj.url.as_str()).collect();

        let mut missing_from_record = Vec::new();
        let mut room_scoped = Vec::new();
        let mut seen = HashSet::new();

        for obj in listing {
            if !obj.key.starts_with(&prefix) {
                continue;
            }
            if !is_direct_child(&prefix, &obj.key) {
                room_scoped.push(obj.clone());
                continue;
            }
            if !recorded.contains(obj.url.as_str()) && seen.insert(obj.url.as_str()) {
                missing_from_record.push(obj.clone());
            }
        }

        let mut absent_seen = HashSet::new();
        let recorded_but_absent = record
            .images
            .iter()
            .map(|img| img.public_url.as_str())
            .filter(|url| !listed.contains(url) && absent_seen.insert(*url))
            .map(str::to_string)
            .collect();

        ReconcileDiff {
            record_id: record.id.clone(),
            missing_from_record,
            recorded_but_absent,
            room_scoped,
        }
    }
}
