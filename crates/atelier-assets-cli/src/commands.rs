//! Command handlers.
//!
//! Reports go to stdout; logs go to stderr.

use anyhow::{Context, Result};
use atelier_assets::{
    AssetEngine, ReorganizeOptions, RunMode, RunOptions, RunReport, SqliteRecordStore,
    StoreSettings, StyleRecord,
};
use std::path::Path;
use tracing::info;

use crate::RunArgs;

fn open_engine(settings: &StoreSettings) -> Result<AssetEngine> {
    let blob_root = settings.require_blob_root()?;
    let base_url = settings.require_public_base_url()?;
    let db_path = settings.require_database_path()?;

    AssetEngine::builder()
        .fs_blob_store(blob_root, base_url)
        .sqlite_record_store(db_path)
        .settings(settings.engine.clone())
        .build()
        .context("opening stores")
}

fn run_options(args: &RunArgs) -> RunOptions {
    let mode = if args.execute {
        RunMode::Execute
    } else {
        RunMode::DryRun
    };
    let mut opts = RunOptions::new().with_mode(mode);
    if !args.ids.is_empty() {
        opts = opts.with_record_ids(args.ids.iter().cloned());
    }
    if let Some(limit) = args.limit {
        opts = opts.with_limit(limit);
    }
    opts
}

fn print_report(report: &RunReport, json: bool) -> Result<i32> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(report.exit_code())
}

pub async fn migrate(settings: &StoreSettings, args: &RunArgs) -> Result<i32> {
    let engine = open_engine(settings)?;
    let report = engine.migrate(&run_options(args)).await?;
    print_report(&report, args.json)
}

pub async fn recover(settings: &StoreSettings, args: &RunArgs) -> Result<i32> {
    let engine = open_engine(settings)?;
    let report = engine.recover(&run_options(args)).await?;
    print_report(&report, args.json)
}

pub async fn reorganize(settings: &StoreSettings, args: &RunArgs, cleanup: bool) -> Result<i32> {
    let engine = open_engine(settings)?;
    let opts = ReorganizeOptions::new(run_options(args)).with_cleanup(cleanup);
    let report = engine.reorganize(&opts).await?;
    print_report(&report, args.json)
}

pub async fn diff(settings: &StoreSettings, id: &str) -> Result<i32> {
    let engine = open_engine(settings)?;
    let diff = engine.diff(id).await?;
    println!("{}", serde_json::to_string_pretty(&diff)?);
    Ok(0)
}

pub fn import_records(settings: &StoreSettings, file: &Path) -> Result<i32> {
    let db_path = settings.require_database_path()?;
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let records: Vec<StyleRecord> =
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", file.display()))?;

    let store = SqliteRecordStore::open(db_path)?;
    for record in &records {
        store.upsert(record)?;
    }

    info!("Imported {} records into {}", records.len(), db_path.display());
    println!("Imported {} records", records.len());
    Ok(0)
}
