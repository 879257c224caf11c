//! Blob store capability consumed by the runners.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::config::EngineConfig;
use crate::error::{AssetError, Result};

/// A listed object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    pub key: String,
    pub url: String,
}

impl BlobObject {
    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        file_name(&self.key)
    }
}

/// Object storage holding image binaries under hierarchical keys.
///
/// Each call is assumed atomic on its own. Calls do not compose into a
/// transaction: a `copy` followed by a failed record update leaves a copied
/// but unlinked object behind, which the next recovery or reorganization
/// pass rediscovers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List every object whose key starts with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>>;

    /// Copy `source_key` to `dest_key`, optionally deleting the source.
    ///
    /// Returns the public URL of the destination.
    async fn copy(&self, source_key: &str, dest_key: &str, delete_source: bool) -> Result<String>;

    /// Public URL an object with this key is served from.
    fn public_url(&self, key: &str) -> String;

    /// Inverse of [`public_url`](Self::public_url), `None` for foreign URLs.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

pub type DynBlobStore = Arc<dyn BlobStore>;

/// Last `/`-separated segment of a key.
pub fn file_name(key: &str) -> &str {
    key.rsplit(EngineConfig::KEY_SEPARATOR)
        .next()
        .unwrap_or(key)
}

/// Whether `key` sits directly under `prefix` with no further nesting.
pub fn is_direct_child(prefix: &str, key: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => !rest.is_empty() && !rest.contains(EngineConfig::KEY_SEPARATOR),
        None => false,
    }
}

/// Reject keys that could escape the store root or are not well-formed.
pub fn validate_key(key: &str) -> Result<()> {
    let malformed = key.is_empty()
        || key.starts_with(EngineConfig::KEY_SEPARATOR)
        || key
            .split(EngineConfig::KEY_SEPARATOR)
            .any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if malformed {
        return Err(AssetError::Validation {
            field: "key".to_string(),
            message: format!("invalid blob key '{}'", key),
        });
    }
    Ok(())
}

/// Maps keys to public URLs under a fixed base and back.
#[derive(Debug, Clone)]
pub struct PublicUrlBase {
    base: String,
}

impl PublicUrlBase {
    /// Parse and normalize a base URL so it always ends with `/`.
    pub fn parse(base: &str) -> Result<Self> {
        let url = Url::parse(base)?;
        if url.cannot_be_a_base() {
            return Err(AssetError::Config {
                message: format!("public base URL cannot be a base: {}", base),
            });
        }
        let mut base = url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self { base })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Public URL for `key`, percent-encoding each segment.
    pub fn url_for(&self, key: &str) -> String {
        let encoded: Vec<_> = key
            .split(EngineConfig::KEY_SEPARATOR)
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect();
        format!("{}{}", self.base, encoded.join("/"))
    }

    /// Key for a URL served under this base.
    pub fn key_for(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.base)?;
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        if rest.is_empty() {
            return None;
        }
        let decoded: Option<Vec<String>> = rest
            .split('/')
            .map(|seg| urlencoding::decode(seg).ok().map(|s| s.into_owned()))
            .collect();
        decoded.map(|segs| segs.join("/"))
    }
}

/// Best-effort key for a URL no store claims: its path without the leading `/`.
pub fn key_from_url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let segments: Vec<String> = parsed
                .path()
                .trim_start_matches('/')
                .split('/')
                .map(|seg| {
                    urlencoding::decode(seg)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| seg.to_string())
                })
                .collect();
            segments.join("/")
        }
        Err(_) => url.trim_start_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_and_direct_child() {
        assert_eq!(file_name("s1/rooms/a.png"), "a.png");
        assert_eq!(file_name("a.png"), "a.png");

        assert!(is_direct_child("", "a.png"));
        assert!(!is_direct_child("", "s1/a.png"));
        assert!(is_direct_child("s1/", "s1/a.png"));
        assert!(!is_direct_child("s1/", "s1/kitchen/a.png"));
        assert!(!is_direct_child("s1/", "s10/a.png"));
        assert!(!is_direct_child("s1/", "s1/"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("s1/a.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/abs.png").is_err());
        assert!(validate_key("s1/../etc/passwd").is_err());
        assert!(validate_key("s1//a.png").is_err());
    }

    #[test]
    fn test_public_url_round_trip_with_spaces() {
        let base = PublicUrlBase::parse("https://cdn.example.com/styles").unwrap();
        assert_eq!(base.as_str(), "https://cdn.example.com/styles/");

        let url = base.url_for("s1/living room.png");
        assert_eq!(url, "https://cdn.example.com/styles/s1/living%20room.png");
        assert_eq!(base.key_for(&url).as_deref(), Some("s1/living room.png"));
        assert_eq!(base.key_for("https://elsewhere.example.com/x.png"), None);
    }

    #[test]
    fn test_key_from_url_path() {
        assert_eq!(
            key_from_url_path("https://old-host.example.com/uploads/a%20b.jpg?v=2"),
            "uploads/a b.jpg"
        );
    }
}
