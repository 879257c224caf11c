//! Blob filename parsing and style-name normalization.
//!
//! Uploaded files are named `{millis}-{8 hex}-{style-name}-{ordinal}.{ext}`.
//! Parsing recovers `{style-name}`; normalization turns it into a token that
//! is compared for exact equality with a style's slug. Both halves are small
//! ordered pipelines of pure string steps so each rule can be tested and
//! extended on its own.

use regex::Regex;
use std::sync::LazyLock;

/// Leading `{digits}-{8 hex}-` upload prefix.
static UPLOAD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-[0-9a-fA-F]{8}-").unwrap());

/// Trailing `-{digits}` ordinal.
static ORDINAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\d+$").unwrap());

/// `-in-` directly before a trailing `off-white`.
static IN_BEFORE_OFF_WHITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-in-(off-white)$").unwrap());

/// Placeholder previously substituted for `&`.
const AMPERSAND_PLACEHOLDER: &str = "-_-";
const IN_INFIX: &str = "-in-";

/// One step of the filename parsing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStep {
    /// Drop everything from the last `.` on.
    StripExtension,
    /// Drop a leading `{digits}-{8 hex}-`. Names without it pass through whole.
    StripUploadPrefix,
    /// Drop a trailing `-{digits}`.
    StripOrdinalSuffix,
}

impl ParseStep {
    pub fn apply(&self, input: &str) -> String {
        match self {
            ParseStep::StripExtension => match input.rfind('.') {
                Some(pos) if pos > 0 => input[..pos].to_string(),
                _ => input.to_string(),
            },
            ParseStep::StripUploadPrefix => UPLOAD_PREFIX.replace(input, "").into_owned(),
            ParseStep::StripOrdinalSuffix => ORDINAL_SUFFIX.replace(input, "").into_owned(),
        }
    }
}

/// One step of the normalization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStep {
    Lowercase,
    /// `-_-` becomes `-`.
    CollapseAmpersandPlaceholder,
    /// `...-in-off-white` becomes `...-off-white`.
    DropInBeforeOffWhite,
    /// Every remaining `-in-` becomes `-`.
    DropIsolatedIn,
}

impl NormalizeStep {
    pub fn apply(&self, input: &str) -> String {
        match self {
            NormalizeStep::Lowercase => input.to_lowercase(),
            NormalizeStep::CollapseAmpersandPlaceholder => input.replace(AMPERSAND_PLACEHOLDER, "-"),
            NormalizeStep::DropInBeforeOffWhite => {
                IN_BEFORE_OFF_WHITE.replace(input, "-$1").into_owned()
            }
            NormalizeStep::DropIsolatedIn => {
                // Adjacent infixes share a dash ("-in-in-"), so repeat until stable.
                let mut current = input.to_string();
                while current.contains(IN_INFIX) {
                    current = current.replace(IN_INFIX, "-");
                }
                current
            }
        }
    }
}

pub const PARSE_PIPELINE: &[ParseStep] = &[
    ParseStep::StripExtension,
    ParseStep::StripUploadPrefix,
    ParseStep::StripOrdinalSuffix,
];

pub const NORMALIZE_PIPELINE: &[NormalizeStep] = &[
    NormalizeStep::Lowercase,
    NormalizeStep::CollapseAmpersandPlaceholder,
    NormalizeStep::DropInBeforeOffWhite,
    NormalizeStep::DropIsolatedIn,
];

/// Recover the human-readable style name from a blob filename.
///
/// Returns `None` when nothing is left after stripping.
///
/// # Examples
///
/// ```
/// use atelier_assets::reconcile::parse_candidate_name;
///
/// assert_eq!(
///     parse_candidate_name("1763377700619-d3d484ee-coastal-calm-2.png").as_deref(),
///     Some("coastal-calm")
/// );
/// assert_eq!(parse_candidate_name("1763377700619-d3d484ee-.png"), None);
/// ```
pub fn parse_candidate_name(filename: &str) -> Option<String> {
    let candidate = PARSE_PIPELINE
        .iter()
        .fold(filename.to_string(), |acc, step| step.apply(&acc));

    if candidate.trim().is_empty() {
        None
    } else {
        Some(candidate)
    }
}

/// Normalize a candidate name into a token comparable with slugs.
///
/// # Examples
///
/// ```
/// use atelier_assets::reconcile::normalize;
///
/// assert_eq!(
///     normalize("Modern-_-Material-Design-Timeless-in-Off-White"),
///     "modern-material-design-timeless-off-white"
/// );
/// ```
pub fn normalize(candidate_name: &str) -> String {
    NORMALIZE_PIPELINE
        .iter()
        .fold(candidate_name.to_string(), |acc, step| step.apply(&acc))
}

/// Exact equality only.
pub fn matches(normalized_name: &str, slug: &str) -> bool {
    normalized_name == slug
}
