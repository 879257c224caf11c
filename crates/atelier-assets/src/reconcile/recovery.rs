//! Orphan recovery for records whose namespace holds unlinked objects.
//!
//! Missing objects are appended after the existing images in listing order;
//! nothing already on the record is reordered or removed. Objects nested under
//! a room-type folder are counted and reported as unsupported, never linked.

use tracing::{debug, info, warn};

use super::diff::Reconciler;
use super::load_scoped_records;
use crate::config::RunOptions;
use crate::error::Result;
use crate::models::{next_display_order, ImageAsset, RunReport, StyleRecord, UnsupportedItem};
use crate::store::{DynBlobStore, DynRecordStore};

/// Feature name reported for room-type scoped blobs.
pub const ROOM_TYPE_FEATURE: &str = "room-type image association";

/// Runs orphan recovery.
pub struct RecoveryRunner {
    records: DynRecordStore,
    reconciler: Reconciler,
}

impl RecoveryRunner {
    pub fn new(records: DynRecordStore, blobs: DynBlobStore) -> Self {
        Self {
            records,
            reconciler: Reconciler::new(blobs),
        }
    }

    /// Recover every record in scope.
    pub async fn run(&self, opts: &RunOptions) -> Result<RunReport> {
        let mut report = RunReport::new(opts.mode);
        let records = load_scoped_records(self.records.as_ref(), opts, &mut report).await?;

        info!(
            "Recovery ({:?}): {} records in scope",
            opts.mode,
            records.len()
        );

        for record in &records {
            report.items_processed += 1;
            if let Err(e) = self.recover_record(record, opts, &mut report).await {
                if !e.is_item_level() {
                    return Err(e);
                }
                report.record_error(record.id.clone(), e);
            }
        }

        info!(
            "Recovery complete: {} processed, {} updated, {} assets recovered, {} errors",
            report.items_processed,
            report.items_updated,
            report.assets_created,
            report.errors.len()
        );

        Ok(report)
    }

    async fn recover_record(
        &self,
        record: &StyleRecord,
        opts: &RunOptions,
        report: &mut RunReport,
    ) -> Result<()> {
        let diff = self.reconciler.diff(record).await?;

        if !diff.room_scoped.is_empty() {
            warn!(
                "{}: {} room-type blobs left unlinked ({} is not supported)",
                record.id,
                diff.room_scoped.len(),
                ROOM_TYPE_FEATURE
            );
            report.unsupported.push(UnsupportedItem {
                item_id: record.id.clone(),
                feature: ROOM_TYPE_FEATURE.to_string(),
                count: diff.room_scoped.len(),
            });
        }

        if !diff.recorded_but_absent.is_empty() {
            debug!(
                "{}: {} recorded URLs not found in its namespace",
                record.id,
                diff.recorded_but_absent.len()
            );
            report.assets_missing_in_store += diff.recorded_but_absent.len();
        }

        if diff.missing_from_record.is_empty() {
            report.items_skipped += 1;
            return Ok(());
        }

        let mut images = record.images.clone();
        let mut order = next_display_order(&images);
        for obj in &diff.missing_from_record {
            images.push(ImageAsset::linked(
                obj.key.clone(),
                obj.url.clone(),
                &record.id,
                order,
            ));
            order += 1;
        }

        if opts.mode.is_execute() {
            self.records.update_images(&record.id, &images).await?;
        }

        debug!(
            "{}: recovered {} images",
            record.id,
            diff.missing_from_record.len()
        );
        report.assets_created += diff.missing_from_record.len();
        report.items_updated += 1;
        Ok(())
    }
}
