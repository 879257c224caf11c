//! Store capabilities the engine consumes, and the adapters shipped with it.
//!
//! ```text
//! BlobStore (list / copy / public_url)      RecordStore (find_many / update_*)
//!     ├── FsBlobStore     - directory tree      ├── SqliteRecordStore - styles table
//!     └── MemoryBlobStore - in process          └── MemoryRecordStore - in process
//! ```
//!
//! Runners only ever see the traits; concrete stores are injected through
//! [`AssetEngineBuilder`](crate::AssetEngineBuilder).

mod blob;
mod fs_blob;
mod memory;
mod records;
mod sqlite;

pub use blob::{
    file_name, is_direct_child, key_from_url_path, validate_key, BlobObject, BlobStore,
    DynBlobStore, PublicUrlBase,
};
pub use fs_blob::FsBlobStore;
pub use memory::{MemoryBlobStore, MemoryRecordStore};
pub use records::{DynRecordStore, RecordFilter, RecordStore};
pub use sqlite::SqliteRecordStore;

#[cfg(test)]
pub(crate) mod testing;
