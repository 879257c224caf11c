//! Style record types as seen by the engine.
//!
//! The engine only reads and patches `images`, `tier` and `legacy_gallery`;
//! every other field of a style lives outside its write authority and is not
//! modelled here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ImageAsset;
use crate::error::AssetError;

/// Commercial tier of a style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Standard,
    Premium,
    Signature,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Premium => "premium",
            Tier::Signature => "signature",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Tier::Standard),
            "premium" => Ok(Tier::Premium),
            "signature" => Ok(Tier::Signature),
            other => Err(AssetError::Validation {
                field: "tier".to_string(),
                message: format!("unknown tier '{}'", other),
            }),
        }
    }
}

/// A pre-migration gallery entry: either a bare URL or `{ "url": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyGalleryEntry {
    Url(String),
    Object { url: String },
}

impl LegacyGalleryEntry {
    pub fn url(&self) -> &str {
        match self {
            LegacyGalleryEntry::Url(url) => url,
            LegacyGalleryEntry::Object { url } => url,
        }
    }
}

/// A style record with the image-reference fields the engine reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    pub id: String,
    /// Canonical normalized name.
    pub slug: String,
    #[serde(default)]
    pub legacy_gallery: Vec<LegacyGalleryEntry>,
    #[serde(default)]
    pub images: Vec<ImageAsset>,
    #[serde(default)]
    pub tier: Option<Tier>,
}

impl StyleRecord {
    pub fn new(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            legacy_gallery: Vec::new(),
            images: Vec::new(),
            tier: None,
        }
    }

    pub fn with_legacy_gallery<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.legacy_gallery = urls
            .into_iter()
            .map(|u| LegacyGalleryEntry::Url(u.into()))
            .collect();
        self
    }

    pub fn with_images(mut self, images: Vec<ImageAsset>) -> Self {
        self.images = images;
        self
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// A record with any images has been migrated and must not be re-derived.
    pub fn is_migrated(&self) -> bool {
        !self.images.is_empty()
    }

    /// Blob key prefix of this record's canonical namespace.
    pub fn namespace_prefix(&self) -> String {
        format!("{}{}", self.id, crate::config::EngineConfig::KEY_SEPARATOR)
    }
}
