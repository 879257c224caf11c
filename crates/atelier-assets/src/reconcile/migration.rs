//! Legacy gallery migration.
//!
//! Converts each style's flat `legacyGallery` URL list into categorized
//! [`ImageAsset`]s and fills in a default tier. Per record:
//!
//! - `images` non-empty: already migrated, content is never re-derived; only
//!   the tier is checked.
//! - `images` empty, gallery non-empty: one asset per entry, the first
//!   [`EngineConfig::OVERVIEW_SLOTS`] as overview shots, the rest as details,
//!   written with a single `update_images` call.
//! - tier absent: set to the configured default after any image write.
//!
//! Re-running converges on the same state and creates nothing new.

use tracing::{debug, info, warn};

use super::load_scoped_records;
use crate::config::{EngineConfig, EngineSettings, RunMode, RunOptions};
use crate::error::Result;
use crate::models::{ImageAsset, ImageCategory, RunReport, StyleRecord};
use crate::store::{key_from_url_path, DynBlobStore, DynRecordStore};

/// What migrating one record did (or would do in a dry run).
#[derive(Debug, Default, PartialEq, Eq)]
struct RecordOutcome {
    assets_created: usize,
    tier_defaulted: bool,
}

impl RecordOutcome {
    fn changed(&self) -> bool {
        self.assets_created > 0 || self.tier_defaulted
    }
}

/// Runs the legacy gallery migration.
pub struct MigrationRunner {
    records: DynRecordStore,
    blobs: DynBlobStore,
    settings: EngineSettings,
}

impl MigrationRunner {
    pub fn new(records: DynRecordStore, blobs: DynBlobStore, settings: EngineSettings) -> Self {
        Self {
            records,
            blobs,
            settings,
        }
    }

    /// Migrate every record in scope.
    ///
    /// Returns `Err` only when the record set cannot be loaded at all.
    pub async fn run(&self, opts: &RunOptions) -> Result<RunReport> {
        let mut report = RunReport::new(opts.mode);
        let records = load_scoped_records(self.records.as_ref(), opts, &mut report).await?;

        info!(
            "Migration ({:?}): {} records in scope",
            opts.mode,
            records.len()
        );

        for record in &records {
            report.items_processed += 1;

            match self.migrate_record(record, opts.mode).await {
                Ok(outcome) => {
                    report.assets_created += outcome.assets_created;
                    if outcome.tier_defaulted {
                        report.tiers_defaulted += 1;
                    }
                    if outcome.changed() {
                        report.items_updated += 1;
                    } else {
                        report.items_skipped += 1;
                    }
                }
                Err(e) if e.is_item_level() => report.record_error(record.id.clone(), e),
                Err(e) => return Err(e),
            }
        }

        info!(
            "Migration complete: {} processed, {} updated, {} skipped, {} assets, {} errors",
            report.items_processed,
            report.items_updated,
            report.items_skipped,
            report.assets_created,
            report.errors.len()
        );

        Ok(report)
    }

    async fn migrate_record(&self, record: &StyleRecord, mode: RunMode) -> Result<RecordOutcome> {
        let mut outcome = RecordOutcome::default();

        if record.is_migrated() {
            debug!("{}: already migrated ({} images)", record.id, record.images.len());
        } else if !record.legacy_gallery.is_empty() {
            let images = self.derive_images(record);
            if mode.is_execute() {
                self.records.update_images(&record.id, &images).await?;
            }
            debug!("{}: derived {} images", record.id, images.len());
            outcome.assets_created = images.len();
        }

        if record.tier.is_none() {
            if mode.is_execute() {
                self.records
                    .update_tier(&record.id, self.settings.default_tier)
                    .await?;
            }
            debug!(
                "{}: tier defaulted to {}",
                record.id, self.settings.default_tier
            );
            outcome.tier_defaulted = true;
        }

        Ok(outcome)
    }

    /// One asset per legacy entry, positioned and categorized by original index.
    fn derive_images(&self, record: &StyleRecord) -> Vec<ImageAsset> {
        record
            .legacy_gallery
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let url = entry.url().trim();
                if url.is_empty() {
                    warn!("{}: skipping blank gallery entry at {}", record.id, index);
                    return None;
                }
                let key = self
                    .blobs
                    .key_for_url(url)
                    .unwrap_or_else(|| key_from_url_path(url));
                let category =
                    ImageCategory::for_gallery_position(index, EngineConfig::OVERVIEW_SLOTS);

                Some(ImageAsset {
                    key,
                    public_url: url.to_string(),
                    category: Some(category),
                    owner_record_id: Some(record.id.clone()),
                    display_order: index as u32,
                })
            })
            .collect()
    }
}
