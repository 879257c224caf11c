//! Data models shared by the stores and runners.

mod asset;
mod report;
mod style;

pub use asset::{links_url, next_display_order, ImageAsset, ImageCategory};
pub use report::{AmbiguousMatch, ItemFailure, RunReport, UnsupportedItem};
pub use style::{LegacyGalleryEntry, StyleRecord, Tier};
