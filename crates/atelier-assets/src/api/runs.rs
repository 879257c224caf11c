//! Runner entry points on [`AssetEngine`].

use tracing::info;

use crate::config::{ReorganizeOptions, RunOptions};
use crate::error::{AssetError, Result};
use crate::models::RunReport;
use crate::reconcile::{
    MigrationRunner, ReconcileDiff, Reconciler, RecoveryRunner, ReorganizationRunner,
};
use crate::store::RecordFilter;
use crate::AssetEngine;

impl AssetEngine {
    /// Migrate legacy galleries into categorized images.
    pub async fn migrate(&self, opts: &RunOptions) -> Result<RunReport> {
        info!("Starting migration run");
        MigrationRunner::new(
            self.records.clone(),
            self.blobs.clone(),
            self.settings.clone(),
        )
        .run(opts)
        .await
    }

    /// Append namespace objects missing from their records.
    pub async fn recover(&self, opts: &RunOptions) -> Result<RunReport> {
        info!("Starting recovery run");
        RecoveryRunner::new(self.records.clone(), self.blobs.clone())
            .run(opts)
            .await
    }

    /// Regroup top-level uploads into per-record namespaces.
    pub async fn reorganize(&self, opts: &ReorganizeOptions) -> Result<RunReport> {
        info!(
            "Starting reorganization run (prefix '{}')",
            self.settings.ungrouped_prefix
        );
        ReorganizationRunner::new(
            self.records.clone(),
            self.blobs.clone(),
            self.settings.clone(),
        )
        .run(opts)
        .await
    }

    /// Read-only reconciliation diff for one record.
    pub async fn diff(&self, record_id: &str) -> Result<ReconcileDiff> {
        let record = self
            .records
            .find_many(&RecordFilter::all().with_ids([record_id]))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AssetError::NotFound {
                record_id: record_id.to_string(),
            })?;

        Reconciler::new(self.blobs.clone()).diff(&record).await
    }
}

#[cfg(test)]
mod tests {
    use crate::models::StyleRecord;
    use crate::store::{MemoryBlobStore, MemoryRecordStore};
    use crate::{AssetEngine, AssetError, EngineSettings, ReorganizeOptions, RunOptions};
    use std::sync::Arc;

    async fn engine() -> (AssetEngine, MemoryRecordStore) {
        let blobs = MemoryBlobStore::new("https://cdn.example.com/").unwrap();
        blobs.put("s1/a.png", b"a".to_vec()).await.unwrap();
        blobs
            .put("1763377700619-d3d484ee-calm-1.png", b"c".to_vec())
            .await
            .unwrap();
        let records = MemoryRecordStore::with_records([StyleRecord::new("s1", "calm")
            .with_legacy_gallery(["https://old.example.com/1.png"])]);
        let engine = AssetEngine::new(
            Arc::new(blobs),
            Arc::new(records.clone()),
            EngineSettings::default(),
        );
        (engine, records)
    }

    #[tokio::test]
    async fn test_engine_runs_all_jobs_in_sequence() {
        let (engine, records) = engine().await;

        let migrated = engine.migrate(&RunOptions::new().execute()).await.unwrap();
        assert_eq!(migrated.assets_created, 1);

        let reorganized = engine
            .reorganize(&ReorganizeOptions::new(RunOptions::new().execute()).with_cleanup(true))
            .await
            .unwrap();
        assert_eq!(reorganized.assets_created, 1);

        let recovered = engine.recover(&RunOptions::new().execute()).await.unwrap();
        assert_eq!(recovered.assets_created, 1);

        // Migrated, reorganized, recovered.
        let record = records.get("s1").await.unwrap();
        assert_eq!(record.images.len(), 3);

        let diff = engine.diff("s1").await.unwrap();
        assert!(diff.missing_from_record.is_empty());
        assert_eq!(diff.recorded_but_absent, vec!["https://old.example.com/1.png"]);
    }

    #[tokio::test]
    async fn test_diff_unknown_record() {
        let (engine, _records) = engine().await;
        let err = engine.diff("nope").await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));
    }
}
