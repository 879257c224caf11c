//! Reconciliation and migration runners.
//!
//! # Architecture
//!
//! ```text
//! MigrationRunner       - legacy gallery -> categorized images, tier default
//! RecoveryRunner        - append namespace blobs missing from a record
//!     └── Reconciler    - namespace listing vs recorded URLs
//! ReorganizationRunner  - top-level blobs -> {recordId}/{filename}
//!     └── naming        - filename -> candidate name -> slug token
//! ```
//!
//! Every runner walks its items one at a time, performs writes only in
//! execute mode, and records per-item failures on the returned
//! [`RunReport`](crate::models::RunReport) instead of aborting.

mod diff;
mod migration;
mod naming;
mod recovery;
mod reorganize;

pub use diff::{ReconcileDiff, Reconciler};
pub use migration::MigrationRunner;
pub use naming::{
    matches, normalize, parse_candidate_name, NormalizeStep, ParseStep, NORMALIZE_PIPELINE,
    PARSE_PIPELINE,
};
pub use recovery::{RecoveryRunner, ROOM_TYPE_FEATURE};
pub use reorganize::{build_match_groups, MatchGroup, ReorganizationRunner};

use std::collections::HashSet;

use crate::config::RunOptions;
use crate::error::{AssetError, Result};
use crate::models::{RunReport, StyleRecord};
use crate::store::{RecordFilter, RecordStore};

/// Fetch the records a run is scoped to.
///
/// Explicitly requested ids that do not exist are recorded as `NotFound`
/// failures. The limit applies after that check so a cap never turns an
/// existing id into a false `NotFound`.
pub(crate) async fn load_scoped_records(
    records: &dyn RecordStore,
    opts: &RunOptions,
    report: &mut RunReport,
) -> Result<Vec<StyleRecord>> {
    let Some(ids) = &opts.record_ids else {
        let mut filter = RecordFilter::all();
        if let Some(limit) = opts.limit {
            filter = filter.with_limit(limit);
        }
        return records.find_many(&filter).await;
    };

    let mut found = records
        .find_many(&RecordFilter::all().with_ids(ids.iter().cloned()))
        .await?;

    let present: HashSet<&str> = found.iter().map(|r| r.id.as_str()).collect();
    let mut reported = HashSet::new();
    for id in ids {
        if !present.contains(id.as_str()) && reported.insert(id.as_str()) {
            report.record_error(
                id.clone(),
                AssetError::NotFound {
                    record_id: id.clone(),
                },
            );
        }
    }

    if let Some(limit) = opts.limit {
        found.truncate(limit);
    }
    Ok(found)
}
