//! Image asset types.

use serde::{Deserialize, Serialize};

/// Category assigned to an image within a style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageCategory {
    Overview,
    Detail,
    Material,
    Texture,
    Composite,
    Anchor,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageCategory::Overview => "OVERVIEW",
            ImageCategory::Detail => "DETAIL",
            ImageCategory::Material => "MATERIAL",
            ImageCategory::Texture => "TEXTURE",
            ImageCategory::Composite => "COMPOSITE",
            ImageCategory::Anchor => "ANCHOR",
        }
    }

    /// Category for a legacy gallery entry at `index`.
    ///
    /// The first `overview_slots` entries are overview shots, the rest details.
    pub fn for_gallery_position(index: usize, overview_slots: usize) -> Self {
        if index < overview_slots {
            ImageCategory::Overview
        } else {
            ImageCategory::Detail
        }
    }
}

/// One stored object referenced by a style record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    /// Hierarchical blob key.
    pub key: String,
    pub public_url: String,
    /// Unset for assets linked by recovery or reorganization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ImageCategory>,
    /// `None` marks an orphan.
    #[serde(default)]
    pub owner_record_id: Option<String>,
    #[serde(default)]
    pub display_order: u32,
}

impl ImageAsset {
    /// Asset owned by `record_id` with no category.
    pub fn linked(
        key: impl Into<String>,
        public_url: impl Into<String>,
        record_id: &str,
        display_order: u32,
    ) -> Self {
        Self {
            key: key.into(),
            public_url: public_url.into(),
            category: None,
            owner_record_id: Some(record_id.to_string()),
            display_order,
        }
    }

    pub fn with_category(mut self, category: ImageCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn is_orphan(&self) -> bool {
        self.owner_record_id.is_none()
    }
}

/// Order for the next image appended after `images`.
///
/// Migration keeps gallery positions, so existing orders may have gaps; the
/// next order is one past the largest, not the list length.
pub fn next_display_order(images: &[ImageAsset]) -> u32 {
    images
        .iter()
        .map(|img| img.display_order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Whether an image with this public URL is already in `images`.
pub fn links_url(images: &[ImageAsset], url: &str) -> bool {
    images.iter().any(|img| img.public_url == url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gallery_position_boundary() {
        let cats: Vec<_> = (0..5)
            .map(|i| ImageCategory::for_gallery_position(i, 3))
            .collect();
        assert_eq!(
            cats,
            vec![
                ImageCategory::Overview,
                ImageCategory::Overview,
                ImageCategory::Overview,
                ImageCategory::Detail,
                ImageCategory::Detail,
            ]
        );
    }

    #[test]
    fn test_asset_serialization_shape() {
        let asset = ImageAsset::linked("s1/a.png", "https://cdn/s1/a.png", "s1", 2)
            .with_category(ImageCategory::Detail);
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["publicUrl"], "https://cdn/s1/a.png");
        assert_eq!(json["category"], "DETAIL");
        assert_eq!(json["ownerRecordId"], "s1");
        assert_eq!(json["displayOrder"], 2);
        assert!(!asset.is_orphan());
    }

    #[test]
    fn test_next_display_order_skips_gaps() {
        assert_eq!(next_display_order(&[]), 0);

        let images: Vec<_> = [0, 2, 3]
            .into_iter()
            .map(|order| ImageAsset::linked(format!("s1/{}.png", order), "u", "s1", order))
            .collect();
        assert_eq!(next_display_order(&images), 4);
        assert!(links_url(&images, "u"));
        assert!(!links_url(&images, "v"));
    }
}
