//! Atelier Assets CLI - operator entry point for the reconciliation jobs.
//!
//! Every job defaults to a dry run. Pass `--execute` to write. The process
//! exits 0 when the run report has no errors, 1 when any item failed, and 2
//! when the run could not start at all.

mod commands;

use anyhow::{Context, Result};
use atelier_assets::{EngineConfig, StoreSettings, Tier};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "atelier-assets")]
#[command(about = "Reconcile style images between the blob store and the record store")]
struct Args {
    /// Settings file (defaults to ./atelier-assets.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory backing the blob store
    #[arg(long, global = true)]
    blob_root: Option<PathBuf>,

    /// Base URL blobs are publicly served from
    #[arg(long, global = true)]
    public_base_url: Option<String>,

    /// SQLite database holding style records
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Prefix holding ungrouped uploads
    #[arg(long, global = true)]
    ungrouped_prefix: Option<String>,

    /// Tier written onto records without one
    #[arg(long, global = true)]
    default_tier: Option<Tier>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by the three jobs.
#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Perform writes (default is a dry run)
    #[arg(long)]
    pub execute: bool,

    /// Process at most this many items
    #[arg(long)]
    pub limit: Option<usize>,

    /// Restrict the run to these record ids
    #[arg(long = "id")]
    pub ids: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert legacy galleries into categorized images
    Migrate(RunArgs),
    /// Link namespace blobs that records lost track of
    Recover(RunArgs),
    /// Move top-level uploads into per-record namespaces
    Reorganize {
        #[command(flatten)]
        run: RunArgs,

        /// Delete source blobs after copying
        #[arg(long)]
        cleanup: bool,
    },
    /// Show the reconciliation diff for one record
    Diff {
        #[arg(long)]
        id: String,
    },
    /// Upsert style records from a JSON array file
    ImportRecords { file: PathBuf },
}

fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Merge the settings file with command-line overrides.
fn resolve_settings(args: &Args) -> Result<StoreSettings> {
    let default_path = PathBuf::from(EngineConfig::SETTINGS_FILE_NAME);
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None if default_path.exists() => Some(default_path),
        None => None,
    };

    let mut settings = match path {
        Some(path) => {
            info!("Settings: {}", path.display());
            StoreSettings::load(&path)
                .with_context(|| format!("loading settings from {}", path.display()))?
        }
        None => StoreSettings::default(),
    };

    if let Some(root) = &args.blob_root {
        settings.blob_root = Some(root.clone());
    }
    if let Some(base) = &args.public_base_url {
        settings.public_base_url = Some(base.clone());
    }
    if let Some(db) = &args.database {
        settings.database_path = Some(db.clone());
    }
    if let Some(prefix) = &args.ungrouped_prefix {
        settings.engine.ungrouped_prefix = prefix.clone();
    }
    if let Some(tier) = args.default_tier {
        settings.engine.default_tier = tier;
    }

    Ok(settings)
}

async fn run(args: Args) -> Result<i32> {
    let settings = resolve_settings(&args)?;

    match args.command {
        Command::Migrate(run) => commands::migrate(&settings, &run).await,
        Command::Recover(run) => commands::recover(&settings, &run).await,
        Command::Reorganize { run, cleanup } => {
            commands::reorganize(&settings, &run, cleanup).await
        }
        Command::Diff { id } => commands::diff(&settings, &id).await,
        Command::ImportRecords { file } => commands::import_records(&settings, &file),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug, args.json_logs);

    match run(args).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code.clamp(1, 255) as u8),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
