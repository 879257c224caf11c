//! Regrouping of top-level uploads into per-record namespaces.
//!
//! # Algorithm
//!
//! 1. **List**: every object directly under the ungrouped prefix.
//! 2. **Group**: bucket objects by parsed candidate name; unparsable names go
//!    straight to the orphan list.
//! 3. **Match**: normalize each group's name and look it up by slug among all
//!    records. No match sends the whole group to the orphan list.
//! 4. **Copy**: each object goes to `{recordId}/{filename}` (source deleted
//!    when cleanup is on). Dry runs only compute the destination URL.
//! 5. **Link**: new URLs are appended to the record's images, seeded from what
//!    the record already holds, and written with one `update_images` per group.
//!
//! A failed copy is recorded against the blob and the rest of the group still
//! proceeds. A failed record update is recorded against the group and its new
//! entries are dropped from the working list, so a later group for the same
//! record writes only its own images.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::naming::{matches, normalize, parse_candidate_name};
use crate::config::{EngineConfig, EngineSettings, ReorganizeOptions};
use crate::error::{AssetError, Result};
use crate::models::{
    links_url, next_display_order, AmbiguousMatch, ImageAsset, RunReport, StyleRecord,
};
use crate::store::{is_direct_child, BlobObject, DynBlobStore, DynRecordStore, RecordFilter};

/// Blobs sharing a parsed candidate name. Built fresh for every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub candidate_name: String,
    pub normalized_name: String,
    pub blobs: Vec<BlobObject>,
}

impl MatchGroup {
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.blobs.iter().map(|b| b.url.as_str())
    }
}

/// Bucket a listing into match groups, in first-seen order.
///
/// Objects not directly under `prefix` are ignored. Objects whose name cannot
/// be parsed are returned separately.
pub fn build_match_groups(
    listing: &[BlobObject],
    prefix: &str,
) -> (Vec<MatchGroup>, Vec<BlobObject>) {
    let mut groups: Vec<MatchGroup> = Vec::new();
    let mut by_candidate: HashMap<String, usize> = HashMap::new();
    let mut unparsable = Vec::new();

    for obj in listing.iter().filter(|o| is_direct_child(prefix, &o.key)) {
        let Some(candidate) = parse_candidate_name(obj.file_name()) else {
            unparsable.push(obj.clone());
            continue;
        };

        match by_candidate.get(&candidate) {
            Some(&idx) => groups[idx].blobs.push(obj.clone()),
            None => {
                by_candidate.insert(candidate.clone(), groups.len());
                groups.push(MatchGroup {
                    normalized_name: normalize(&candidate),
                    candidate_name: candidate,
                    blobs: vec![obj.clone()],
                });
            }
        }
    }

    (groups, unparsable)
}

/// Runs the reorganization job.
pub struct ReorganizationRunner {
    records: DynRecordStore,
    blobs: DynBlobStore,
    settings: EngineSettings,
}

impl ReorganizationRunner {
    pub fn new(records: DynRecordStore, blobs: DynBlobStore, settings: EngineSettings) -> Self {
        Self {
            records,
            blobs,
            settings,
        }
    }

    /// Reorganize every ungrouped blob.
    ///
    /// Returns `Err` only when the ungrouped listing or the record set cannot
    /// be loaded.
    pub async fn run(&self, opts: &ReorganizeOptions) -> Result<RunReport> {
        let mode = opts.run.mode;
        let mut report = RunReport::new(mode);
        let prefix = self.settings.ungrouped_prefix.as_str();

        let listing = self.blobs.list(prefix).await?;
        let (groups, unparsable) = build_match_groups(&listing, prefix);
        report
            .orphans
            .extend(unparsable.iter().map(|b| b.url.clone()));

        let records = self.records.find_many(&RecordFilter::all()).await?;
        let scope = self.resolve_scope(&records, opts, &mut report);

        info!(
            "Reorganization ({:?}): {} groups, {} unparsable, {} records",
            mode,
            groups.len(),
            unparsable.len(),
            records.len()
        );

        // Working image lists, seeded from the store and carried across groups
        // so two groups resolving to one record do not overwrite each other.
        let mut working: HashMap<String, Vec<ImageAsset>> = HashMap::new();
        let mut flagged: HashSet<String> = HashSet::new();
        let mut matched_groups = 0usize;

        for group in &groups {
            let candidates: Vec<&StyleRecord> = records
                .iter()
                .filter(|r| matches(&group.normalized_name, &r.slug))
                .collect();

            let Some(record) = candidates.first().copied() else {
                debug!(
                    "No record for '{}' ({} blobs)",
                    group.normalized_name,
                    group.blobs.len()
                );
                report.orphans.extend(group.urls().map(str::to_string));
                continue;
            };

            if candidates.len() > 1 && flagged.insert(group.normalized_name.clone()) {
                let record_ids: Vec<String> = candidates.iter().map(|r| r.id.clone()).collect();
                warn!(
                    "Slug '{}' matches {} records ({}); using {}",
                    group.normalized_name,
                    record_ids.len(),
                    record_ids.join(", "),
                    record.id
                );
                report.ambiguous_matches.push(AmbiguousMatch {
                    normalized_name: group.normalized_name.clone(),
                    record_ids,
                });
            }

            if let Some(scope) = &scope {
                if !scope.contains(record.id.as_str()) {
                    debug!("Skipping '{}': {} is out of scope", group.candidate_name, record.id);
                    continue;
                }
            }
            if opts.run.limit.is_some_and(|limit| matched_groups >= limit) {
                debug!("Limit reached, leaving '{}' for a later run", group.candidate_name);
                continue;
            }
            matched_groups += 1;

            let images = working
                .entry(record.id.clone())
                .or_insert_with(|| record.images.clone());
            self.process_group(group, record, images, opts, &mut report)
                .await;
        }

        info!(
            "Reorganization complete: {} groups, {} updated, {} assets linked, {} orphans, {} errors",
            report.items_processed,
            report.items_updated,
            report.assets_created,
            report.orphans.len(),
            report.errors.len()
        );

        Ok(report)
    }

    /// Record ids the run may touch, `None` when unrestricted.
    fn resolve_scope<'a>(
        &self,
        records: &'a [StyleRecord],
        opts: &'a ReorganizeOptions,
        report: &mut RunReport,
    ) -> Option<HashSet<&'a str>> {
        let ids = opts.run.record_ids.as_ref()?;
        let known: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let mut scope = HashSet::new();
        for id in ids {
            if known.contains(id.as_str()) {
                scope.insert(id.as_str());
            } else if scope.insert(id.as_str()) {
                report.record_error(
                    id.clone(),
                    AssetError::NotFound {
                        record_id: id.clone(),
                    },
                );
            }
        }
        Some(scope)
    }

    async fn process_group(
        &self,
        group: &MatchGroup,
        record: &StyleRecord,
        images: &mut Vec<ImageAsset>,
        opts: &ReorganizeOptions,
        report: &mut RunReport,
    ) {
        let execute = opts.run.mode.is_execute();
        report.items_processed += 1;
        let linked_before = images.len();
        let mut order = next_display_order(images);

        for blob in &group.blobs {
            let dest_key = format!(
                "{}{}{}",
                record.id,
                EngineConfig::KEY_SEPARATOR,
                blob.file_name()
            );

            let url = if execute {
                match self.blobs.copy(&blob.key, &dest_key, opts.cleanup).await {
                    Ok(url) => url,
                    Err(e) => {
                        report.record_error(blob.url.clone(), e);
                        continue;
                    }
                }
            } else {
                self.blobs.public_url(&dest_key)
            };

            report.assets_copied += 1;
            if opts.cleanup {
                report.assets_deleted += 1;
            }

            if links_url(images, &url) {
                debug!("{} already linked to {}", url, record.id);
                continue;
            }
            images.push(ImageAsset::linked(dest_key, url, &record.id, order));
            order += 1;
        }

        let linked = images.len() - linked_before;

        if linked == 0 {
            report.items_skipped += 1;
            return;
        }

        if execute {
            if let Err(e) = self.records.update_images(&record.id, images).await {
                // The copies stand but stay unlinked until a later run; later
                // groups for this record must not write them either.
                images.truncate(linked_before);
                report.record_error(group.candidate_name.clone(), e);
                return;
            }
        }

        debug!(
            "'{}' -> {}: {} new images",
            group.candidate_name, record.id, linked
        );
        report.assets_created += linked;
        report.items_updated += 1;
    }
}
