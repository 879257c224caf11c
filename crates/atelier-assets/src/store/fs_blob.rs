//! Directory-backed blob store.
//!
//! Keys map onto paths relative to the root directory, one directory level per
//! `/`-separated segment.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::blob::{validate_key, BlobObject, BlobStore, PublicUrlBase};
use crate::config::EngineConfig;
use crate::error::{AssetError, Result};

/// Blob store over a local (or mounted) directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base: PublicUrlBase,
}

impl FsBlobStore {
    /// Open a store rooted at `root`, serving objects under `public_base_url`.
    ///
    /// The root must already exist.
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AssetError::Config {
                message: format!("Blob root is not a directory: {}", root.display()),
            });
        }
        Ok(Self {
            root,
            public_base: PublicUrlBase::parse(public_base_url)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key
            .split(EngineConfig::KEY_SEPARATOR)
            .fold(self.root.clone(), |path, seg| path.join(seg)))
    }

    fn key_for_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        segments.map(|segs| segs.join("/"))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let mut objects = Vec::new();

        // Walk only the deepest directory the prefix names; the partial last
        // segment is matched by the `starts_with` filter below.
        let start = match prefix.rfind(EngineConfig::KEY_SEPARATOR) {
            Some(pos) => self.path_for(&prefix[..pos])?,
            None => self.root.clone(),
        };
        if !start.is_dir() {
            debug!("No objects under '{}'", prefix);
            return Ok(objects);
        }

        for entry in WalkDir::new(&start).min_depth(1) {
            let entry = entry.map_err(|e| AssetError::blob("list", e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(key) = self.key_for_path(entry.path()) else {
                debug!("Skipping non UTF-8 path: {}", entry.path().display());
                continue;
            };
            if key.starts_with(prefix) {
                let url = self.public_base.url_for(&key);
                objects.push(BlobObject { key, url });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn copy(&self, source_key: &str, dest_key: &str, delete_source: bool) -> Result<String> {
        let src = self.path_for(source_key)?;
        let dest = self.path_for(dest_key)?;

        if !src.is_file() {
            return Err(AssetError::blob(
                "copy",
                format!("source object does not exist: {}", source_key),
            ));
        }

        if src != dest {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AssetError::blob("copy", format!("{}: {}", parent.display(), e))
                })?;
            }
            tokio::fs::copy(&src, &dest).await.map_err(|e| {
                AssetError::blob("copy", format!("{} -> {}: {}", source_key, dest_key, e))
            })?;

            if delete_source {
                tokio::fs::remove_file(&src).await.map_err(|e| {
                    AssetError::blob("delete", format!("{}: {}", source_key, e))
                })?;
            }
        }

        debug!("Copied {} -> {}", source_key, dest_key);
        Ok(self.public_base.url_for(dest_key))
    }

    fn public_url(&self, key: &str) -> String {
        self.public_base.url_for(key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        self.public_base.key_for(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (TempDir, FsBlobStore) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("s1/kitchen")).unwrap();
        std::fs::write(dir.path().join("b.png"), b"b").unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::write(dir.path().join("s1/one.png"), b"1").unwrap();
        std::fs::write(dir.path().join("s1/kitchen/two.png"), b"2").unwrap();

        let store = FsBlobStore::new(dir.path(), "https://cdn.example.com/").unwrap();
        (dir, store)
    }

    #[test]
    fn test_new_requires_existing_root() {
        assert!(FsBlobStore::new("/nonexistent/blob/root", "https://cdn.example.com/").is_err());
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_prefixed() {
        let (_dir, store) = create_store();

        let all = store.list("").await.unwrap();
        let keys: Vec<_> = all.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.png", "b.png", "s1/kitchen/two.png", "s1/one.png"]);

        let scoped = store.list("s1/").await.unwrap();
        assert_eq!(scoped.len(), 2);
        assert_eq!(scoped[1].url, "https://cdn.example.com/s1/one.png");
    }

    #[tokio::test]
    async fn test_copy_with_and_without_delete() {
        let (dir, store) = create_store();

        let url = store.copy("a.png", "s2/a.png", false).await.unwrap();
        assert_eq!(url, "https://cdn.example.com/s2/a.png");
        assert!(dir.path().join("a.png").exists());
        assert_eq!(std::fs::read(dir.path().join("s2/a.png")).unwrap(), b"a");

        store.copy("b.png", "s2/b.png", true).await.unwrap();
        assert!(!dir.path().join("b.png").exists());
        assert!(dir.path().join("s2/b.png").exists());
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_store_error() {
        let (_dir, store) = create_store();
        let err = store.copy("nope.png", "s1/nope.png", false).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StoreIo);
    }

    #[tokio::test]
    async fn test_copy_rejects_escaping_keys() {
        let (_dir, store) = create_store();
        assert!(store.copy("a.png", "../a.png", false).await.is_err());
    }

    #[tokio::test]
    async fn test_list_walks_only_the_prefix_directory() {
        let (dir, store) = create_store();
        std::fs::create_dir_all(dir.path().join("s10")).unwrap();
        std::fs::write(dir.path().join("s10/ten.png"), b"10").unwrap();

        let keys: Vec<_> = store
            .list("s1/")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        assert_eq!(keys, vec!["s1/kitchen/two.png", "s1/one.png"]);

        // Partial last segment.
        let partial = store.list("s1/o").await.unwrap();
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].key, "s1/one.png");

        // No separator: the whole root is candidates.
        let loose = store.list("s1").await.unwrap();
        assert_eq!(loose.len(), 3);
    }

    #[tokio::test]
    async fn test_list_missing_prefix_directory_is_empty() {
        let (_dir, store) = create_store();
        assert!(store.list("ghost/").await.unwrap().is_empty());
        assert!(store.list("s1/kitchen/pantry/").await.unwrap().is_empty());
        assert!(store.list("../").await.is_err());
    }
}
