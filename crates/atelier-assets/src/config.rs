//! Centralized configuration for the asset engine.
//!
//! Engine constants live on [`EngineConfig`]. Store locations and tunables
//! that differ between deployments are read from a JSON settings file into
//! [`StoreSettings`].

use crate::error::{AssetError, Result};
use crate::models::Tier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine-level constants.
pub struct EngineConfig;

impl EngineConfig {
    /// Number of leading legacy gallery entries categorized as overview shots.
    pub const OVERVIEW_SLOTS: usize = 3;
    /// Prefix holding blobs that were uploaded without a record namespace.
    pub const DEFAULT_UNGROUPED_PREFIX: &'static str = "";
    pub const KEY_SEPARATOR: char = '/';
    pub const SETTINGS_FILE_NAME: &'static str = "atelier-assets.json";
}

/// Behavioral settings shared by all runners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Blob prefix scanned by the reorganization runner.
    pub ungrouped_prefix: String,
    /// Tier written onto records that have none.
    pub default_tier: Tier,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ungrouped_prefix: EngineConfig::DEFAULT_UNGROUPED_PREFIX.to_string(),
            default_tier: Tier::default(),
        }
    }
}

/// Locations of the stores the engine operates on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Directory backing the filesystem blob store.
    pub blob_root: Option<PathBuf>,
    /// Base URL objects are publicly served from.
    pub public_base_url: Option<String>,
    /// SQLite database holding style records.
    pub database_path: Option<PathBuf>,
    pub engine: EngineSettings,
}

impl StoreSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AssetError::Io {
            message: format!("Failed to read settings file {}", path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;

        serde_json::from_str(&contents).map_err(|e| AssetError::Json {
            message: format!("Failed to parse {}: {}", path.display(), e),
            source: Some(e),
        })
    }

    /// Resolve the blob root, failing when it was never configured.
    pub fn require_blob_root(&self) -> Result<&Path> {
        self.blob_root.as_deref().ok_or_else(|| AssetError::Config {
            message: "blobRoot is not configured".to_string(),
        })
    }

    /// Resolve the public base URL, failing when it was never configured.
    pub fn require_public_base_url(&self) -> Result<&str> {
        self.public_base_url
            .as_deref()
            .ok_or_else(|| AssetError::Config {
                message: "publicBaseUrl is not configured".to_string(),
            })
    }

    /// Resolve the database path, failing when it was never configured.
    pub fn require_database_path(&self) -> Result<&Path> {
        self.database_path
            .as_deref()
            .ok_or_else(|| AssetError::Config {
                message: "databasePath is not configured".to_string(),
            })
    }
}

/// Whether a run performs side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    DryRun,
    Execute,
}

impl RunMode {
    pub fn is_execute(&self) -> bool {
        matches!(self, RunMode::Execute)
    }
}

/// Scope and mode for a single runner invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub mode: RunMode,
    /// Restrict the run to these record ids.
    pub record_ids: Option<Vec<String>>,
    /// Cap on the number of items processed.
    pub limit: Option<usize>,
}

impl RunOptions {
    /// Dry-run options with no scope filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to execute mode.
    pub fn execute(mut self) -> Self {
        self.mode = RunMode::Execute;
        self
    }

    /// Set the run mode.
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restrict the run to the given record ids.
    pub fn with_record_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Cap the number of items processed.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Options for the reorganization runner.
#[derive(Debug, Clone, Default)]
pub struct ReorganizeOptions {
    pub run: RunOptions,
    /// Delete source blobs after a successful copy.
    pub cleanup: bool,
}

impl ReorganizeOptions {
    pub fn new(run: RunOptions) -> Self {
        Self {
            run,
            cleanup: false,
        }
    }

    /// Enable or disable source cleanup.
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}
