//! Run report accumulated by each runner.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::warn;

use crate::config::RunMode;
use crate::error::AssetError;

/// A failure recorded against a single record, group, or blob.
#[derive(Debug)]
pub struct ItemFailure {
    pub item_id: String,
    pub error: AssetError,
}

impl Serialize for ItemFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ItemFailure", 3)?;
        state.serialize_field("itemId", &self.item_id)?;
        state.serialize_field("kind", &self.error.kind())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

/// Several records share a slug that a blob group normalized to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbiguousMatch {
    pub normalized_name: String,
    /// Candidate record ids in the order considered; the first one was used.
    pub record_ids: Vec<String>,
}

/// Work the engine found but deliberately does not perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsupportedItem {
    pub item_id: String,
    pub feature: String,
    pub count: usize,
}

/// Counts and failures from one runner invocation.
///
/// Never persisted; printed to the operator and used as the exit signal.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub mode: RunMode,
    pub items_processed: usize,
    pub items_updated: usize,
    pub items_skipped: usize,
    pub assets_created: usize,
    pub assets_copied: usize,
    pub assets_deleted: usize,
    pub tiers_defaulted: usize,
    pub assets_missing_in_store: usize,
    pub orphans: Vec<String>,
    pub ambiguous_matches: Vec<AmbiguousMatch>,
    pub unsupported: Vec<UnsupportedItem>,
    pub errors: Vec<ItemFailure>,
}

impl RunReport {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Record a per-item failure and keep going.
    pub fn record_error(&mut self, item_id: impl Into<String>, error: AssetError) {
        let item_id = item_id.into();
        warn!("{}: {}", item_id, error);
        self.errors.push(ItemFailure { item_id, error });
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Counts only, for comparing two runs over the same input.
    pub fn counts(&self) -> [usize; 8] {
        [
            self.items_processed,
            self.items_updated,
            self.items_skipped,
            self.assets_created,
            self.assets_copied,
            self.assets_deleted,
            self.tiers_defaulted,
            self.assets_missing_in_store,
        ]
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            RunMode::DryRun => "dry run",
            RunMode::Execute => "execute",
        };
        writeln!(f, "Run summary ({})", mode)?;
        writeln!(f, "  processed:        {}", self.items_processed)?;
        writeln!(f, "  updated:          {}", self.items_updated)?;
        writeln!(f, "  skipped:          {}", self.items_skipped)?;
        writeln!(f, "  assets created:   {}", self.assets_created)?;
        if self.assets_copied > 0 || self.assets_deleted > 0 {
            writeln!(f, "  assets copied:    {}", self.assets_copied)?;
            writeln!(f, "  assets deleted:   {}", self.assets_deleted)?;
        }
        if self.tiers_defaulted > 0 {
            writeln!(f, "  tiers defaulted:  {}", self.tiers_defaulted)?;
        }
        if self.assets_missing_in_store > 0 {
            writeln!(f, "  missing in store: {}", self.assets_missing_in_store)?;
        }

        if !self.orphans.is_empty() {
            writeln!(f, "Orphans ({}):", self.orphans.len())?;
            for url in &self.orphans {
                writeln!(f, "  {}", url)?;
            }
        }
        for m in &self.ambiguous_matches {
            writeln!(
                f,
                "Ambiguous match for '{}': {} (used {})",
                m.normalized_name,
                m.record_ids.join(", "),
                m.record_ids.first().map(String::as_str).unwrap_or("-")
            )?;
        }
        for item in &self.unsupported {
            writeln!(
                f,
                "Not supported for {}: {} ({} blobs)",
                item.item_id, item.feature, item.count
            )?;
        }

        if self.errors.is_empty() {
            write!(f, "No errors")
        } else {
            writeln!(f, "Errors ({}):", self.errors.len())?;
            for (i, failure) in self.errors.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "  {}: {}", failure.item_id, failure.error)?;
            }
            Ok(())
        }
    }
}
