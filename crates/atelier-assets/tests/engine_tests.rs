//! Engine tests over the bundled filesystem and SQLite stores.

use atelier_assets::{
    AssetEngine, DynBlobStore, DynRecordStore, EngineSettings, FsBlobStore, ImageCategory,
    ReorganizeOptions, RunMode, RunOptions, SqliteRecordStore, StyleRecord, Tier,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const BASE_URL: &str = "https://cdn.example.com/";

struct TestEnv {
    _temp: TempDir,
    blob_root: std::path::PathBuf,
    records: Arc<SqliteRecordStore>,
    engine: AssetEngine,
}

fn create_test_env(records: &[StyleRecord]) -> TestEnv {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let blob_root = temp.path().join("blobs");
    std::fs::create_dir_all(&blob_root).unwrap();

    let store = Arc::new(SqliteRecordStore::open(temp.path().join("styles.db")).unwrap());
    for record in records {
        store.upsert(record).unwrap();
    }

    let blobs: DynBlobStore = Arc::new(FsBlobStore::new(&blob_root, BASE_URL).unwrap());
    let dyn_records: DynRecordStore = store.clone();
    let engine = AssetEngine::new(blobs, dyn_records, EngineSettings::default());

    TestEnv {
        _temp: temp,
        blob_root,
        records: store,
        engine,
    }
}

fn put_blob(root: &Path, key: &str) {
    let path = root.join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, key.as_bytes()).unwrap();
}

#[tokio::test]
async fn test_migration_categorizes_gallery() {
    let env = create_test_env(&[StyleRecord::new("s1", "calm").with_legacy_gallery([
        "https://cdn.example.com/s1/a.png",
        "https://cdn.example.com/s1/b.png",
        "https://cdn.example.com/s1/c.png",
        "https://cdn.example.com/s1/d.png",
        "https://cdn.example.com/s1/e.png",
    ])]);

    let report = env.engine.migrate(&RunOptions::new().execute()).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.assets_created, 5);
    assert_eq!(report.tiers_defaulted, 1);

    let record = env.records.get("s1").unwrap().unwrap();
    let categories: Vec<_> = record.images.iter().map(|i| i.category).collect();
    assert_eq!(
        categories,
        vec![
            Some(ImageCategory::Overview),
            Some(ImageCategory::Overview),
            Some(ImageCategory::Overview),
            Some(ImageCategory::Detail),
            Some(ImageCategory::Detail),
        ]
    );
    let orders: Vec<_> = record.images.iter().map(|i| i.display_order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3, 4]);
    assert_eq!(record.images[0].key, "s1/a.png");
    assert_eq!(record.tier, Some(Tier::Standard));

    // Second run is a no-op.
    let again = env.engine.migrate(&RunOptions::new().execute()).await.unwrap();
    assert_eq!(again.assets_created, 0);
    assert_eq!(again.items_updated, 0);
    assert_eq!(env.records.get("s1").unwrap().unwrap(), record);
}

#[tokio::test]
async fn test_dry_run_matches_execute_counts() {
    let records = [
        StyleRecord::new("s1", "calm").with_legacy_gallery(["https://old.example.com/1.png"]),
        StyleRecord::new("s2", "warm").with_tier(Tier::Premium),
    ];

    let dry_env = create_test_env(&records);
    let dry = dry_env.engine.migrate(&RunOptions::new()).await.unwrap();
    assert_eq!(dry.mode, RunMode::DryRun);
    assert!(dry_env.records.get("s1").unwrap().unwrap().images.is_empty());

    let exec_env = create_test_env(&records);
    let exec = exec_env
        .engine
        .migrate(&RunOptions::new().execute())
        .await
        .unwrap();
    assert_eq!(dry.counts(), exec.counts());
}

#[tokio::test]
async fn test_reorganize_moves_uploads_into_namespace() {
    let env = create_test_env(&[
        StyleRecord::new("s1", "modern-material-design-timeless-off-white"),
        StyleRecord::new("s2", "calm"),
    ]);
    put_blob(
        &env.blob_root,
        "1763377700619-d3d484ee-modern-_-material-design-timeless-in-off-white-1.png",
    );
    put_blob(
        &env.blob_root,
        "1763377700619-d3d484ee-modern-_-material-design-timeless-in-off-white-2.png",
    );
    put_blob(&env.blob_root, "1763377700619-d3d484ee-nobody-1.png");
    put_blob(&env.blob_root, "s2/already-here.png");

    let opts = ReorganizeOptions::new(RunOptions::new().execute()).with_cleanup(true);
    let report = env.engine.reorganize(&opts).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.assets_copied, 2);
    assert_eq!(report.assets_deleted, 2);
    assert_eq!(report.items_updated, 1);
    assert_eq!(
        report.orphans,
        vec!["https://cdn.example.com/1763377700619-d3d484ee-nobody-1.png"]
    );

    let record = env.records.get("s1").unwrap().unwrap();
    assert_eq!(record.images.len(), 2);
    assert!(record.images.iter().all(|i| i.key.starts_with("s1/")));
    assert!(env
        .blob_root
        .join("s1/1763377700619-d3d484ee-modern-_-material-design-timeless-in-off-white-1.png")
        .exists());

    // Nested objects were never touched.
    assert!(env.blob_root.join("s2/already-here.png").exists());
    assert!(env.records.get("s2").unwrap().unwrap().images.is_empty());

    // Nothing left to move.
    let again = env.engine.reorganize(&opts).await.unwrap();
    assert_eq!(again.assets_copied, 0);
    assert_eq!(again.assets_created, 0);
}

#[tokio::test]
async fn test_recovery_links_namespace_blobs() {
    let env = create_test_env(&[StyleRecord::new("s1", "calm")]);
    put_blob(&env.blob_root, "s1/a.png");
    put_blob(&env.blob_root, "s1/b.png");
    put_blob(&env.blob_root, "s1/kitchen/c.png");

    let dry = env.engine.recover(&RunOptions::new()).await.unwrap();
    let exec = env.engine.recover(&RunOptions::new().execute()).await.unwrap();
    assert_eq!(dry.counts(), exec.counts());
    assert_eq!(exec.assets_created, 2);
    assert_eq!(exec.unsupported.len(), 1);
    assert_eq!(exec.unsupported[0].item_id, "s1");

    let record = env.records.get("s1").unwrap().unwrap();
    let keys: Vec<_> = record.images.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["s1/a.png", "s1/b.png"]);

    let diff = env.engine.diff("s1").await.unwrap();
    assert!(diff.missing_from_record.is_empty());
    assert!(diff.recorded_but_absent.is_empty());
    assert_eq!(diff.room_scoped.len(), 1);

    let again = env.engine.recover(&RunOptions::new().execute()).await.unwrap();
    assert_eq!(again.assets_created, 0);
}

#[tokio::test]
async fn test_scoped_run_reports_unknown_ids() {
    let env = create_test_env(&[
        StyleRecord::new("s1", "calm").with_legacy_gallery(["https://old.example.com/1.png"]),
        StyleRecord::new("s2", "warm").with_legacy_gallery(["https://old.example.com/2.png"]),
    ]);

    let opts = RunOptions::new()
        .execute()
        .with_record_ids(["s2", "ghost"]);
    let report = env.engine.migrate(&opts).await.unwrap();
    assert_eq!(report.items_processed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].item_id, "ghost");
    assert_eq!(report.exit_code(), 1);

    assert!(env.records.get("s1").unwrap().unwrap().images.is_empty());
    assert_eq!(env.records.get("s2").unwrap().unwrap().images.len(), 1);
}
