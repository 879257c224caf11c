//! Atelier Assets - Headless reconciliation engine for style image libraries.
//!
//! Keeps image objects in a blob store consistent with the style records that
//! reference them: migrates legacy galleries into categorized images, recovers
//! objects a record lost track of, and regroups stray uploads into per-record
//! namespaces. It can be embedded directly or driven from the
//! `atelier-assets` CLI.
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_assets::{AssetEngine, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> atelier_assets::Result<()> {
//!     let engine = AssetEngine::builder()
//!         .fs_blob_store("./blobs", "https://cdn.example.com/")
//!         .sqlite_record_store("./styles.db")
//!         .build()?;
//!
//!     let report = engine.migrate(&RunOptions::new()).await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod store;

mod api;

pub use api::AssetEngineBuilder;
pub use config::{EngineConfig, EngineSettings, ReorganizeOptions, RunMode, RunOptions, StoreSettings};
pub use error::{AssetError, ErrorKind, Result, StoreKind};
pub use models::{
    AmbiguousMatch, ImageAsset, ImageCategory, ItemFailure, LegacyGalleryEntry, RunReport,
    StyleRecord, Tier, UnsupportedItem,
};
pub use reconcile::{
    MatchGroup, MigrationRunner, ReconcileDiff, Reconciler, RecoveryRunner, ReorganizationRunner,
};
pub use store::{
    BlobObject, BlobStore, DynBlobStore, DynRecordStore, FsBlobStore, MemoryBlobStore,
    MemoryRecordStore, RecordFilter, RecordStore, SqliteRecordStore,
};

/// Entry point for running the engine's jobs.
///
/// Stores are injected at construction; the engine holds no global clients.
/// Each call constructs a fresh runner and walks its items sequentially.
pub struct AssetEngine {
    blobs: DynBlobStore,
    records: DynRecordStore,
    settings: EngineSettings,
}

impl AssetEngine {
    /// Create an engine over the given stores.
    pub fn new(blobs: DynBlobStore, records: DynRecordStore, settings: EngineSettings) -> Self {
        Self {
            blobs,
            records,
            settings,
        }
    }

    /// Create a builder for AssetEngine.
    pub fn builder() -> AssetEngineBuilder {
        AssetEngineBuilder::new()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn blob_store(&self) -> &DynBlobStore {
        &self.blobs
    }

    pub fn record_store(&self) -> &DynRecordStore {
        &self.records
    }
}
