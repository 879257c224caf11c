//! Builder for configuring AssetEngine initialization.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{EngineSettings, StoreSettings};
use crate::error::{AssetError, Result};
use crate::store::{DynBlobStore, DynRecordStore, FsBlobStore, SqliteRecordStore};
use crate::AssetEngine;

/// How the builder obtains a blob store.
enum BlobSource {
    Unset,
    Injected(DynBlobStore),
    Fs { root: PathBuf, public_base_url: String },
}

/// How the builder obtains a record store.
enum RecordSource {
    Unset,
    Injected(DynRecordStore),
    Sqlite { db_path: PathBuf },
}

/// Builder for configuring AssetEngine initialization.
///
/// Either inject stores directly or let the builder open the bundled
/// filesystem and SQLite adapters. Failing to open a store is fatal for the
/// run and surfaces from [`build`](Self::build).
///
/// # Example
///
/// ```rust,ignore
/// use atelier_assets::{AssetEngine, StoreSettings};
///
/// let settings = StoreSettings::load("atelier-assets.json".as_ref())?;
/// let engine = AssetEngine::builder()
///     .from_settings(&settings)
///     .build()?;
/// ```
pub struct AssetEngineBuilder {
    blobs: BlobSource,
    records: RecordSource,
    settings: EngineSettings,
    create_blob_root: bool,
}

impl Default for AssetEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetEngineBuilder {
    pub fn new() -> Self {
        Self {
            blobs: BlobSource::Unset,
            records: RecordSource::Unset,
            settings: EngineSettings::default(),
            create_blob_root: false,
        }
    }

    /// Use an already constructed blob store.
    pub fn blob_store(mut self, blobs: DynBlobStore) -> Self {
        self.blobs = BlobSource::Injected(blobs);
        self
    }

    /// Use an already constructed record store.
    pub fn record_store(mut self, records: DynRecordStore) -> Self {
        self.records = RecordSource::Injected(records);
        self
    }

    /// Open a directory-backed blob store at build time.
    pub fn fs_blob_store(mut self, root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        self.blobs = BlobSource::Fs {
            root: root.into(),
            public_base_url: public_base_url.into(),
        };
        self
    }

    /// Open a SQLite record store at build time.
    pub fn sqlite_record_store(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.records = RecordSource::Sqlite {
            db_path: db_path.into(),
        };
        self
    }

    /// Create the blob root directory if it doesn't exist.
    ///
    /// Default: `false` (the directory must exist)
    pub fn create_blob_root(mut self, enable: bool) -> Self {
        self.create_blob_root = enable;
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Take store locations and engine settings from a settings file.
    ///
    /// Locations missing from `settings` leave the current source untouched.
    pub fn from_settings(mut self, settings: &StoreSettings) -> Self {
        if let (Some(root), Some(base)) = (&settings.blob_root, &settings.public_base_url) {
            self = self.fs_blob_store(root.clone(), base.clone());
        }
        if let Some(db_path) = &settings.database_path {
            self = self.sqlite_record_store(db_path.clone());
        }
        self.settings = settings.engine.clone();
        self
    }

    /// Build the AssetEngine instance.
    pub fn build(self) -> Result<AssetEngine> {
        let blobs: DynBlobStore = match self.blobs {
            BlobSource::Unset => {
                return Err(AssetError::Config {
                    message: "No blob store configured".to_string(),
                })
            }
            BlobSource::Injected(blobs) => blobs,
            BlobSource::Fs {
                root,
                public_base_url,
            } => {
                if self.create_blob_root && !root.exists() {
                    std::fs::create_dir_all(&root)
                        .map_err(|e| AssetError::io_with_path(e, &root))?;
                }
                info!("Blob store: {} ({})", root.display(), public_base_url);
                let store = FsBlobStore::new(root, &public_base_url).map_err(|e| {
                    AssetError::Config {
                        message: format!("Failed to open blob store: {}", e),
                    }
                })?;
                Arc::new(store)
            }
        };

        let records: DynRecordStore = match self.records {
            RecordSource::Unset => {
                return Err(AssetError::Config {
                    message: "No record store configured".to_string(),
                })
            }
            RecordSource::Injected(records) => records,
            RecordSource::Sqlite { db_path } => {
                info!("Record store: {}", db_path.display());
                let store = SqliteRecordStore::open(&db_path).map_err(|e| AssetError::Config {
                    message: format!("Failed to open record store {}: {}", db_path.display(), e),
                })?;
                Arc::new(store)
            }
        };

        Ok(AssetEngine::new(blobs, records, self.settings))
    }
}
