//! Change-set resolution against a base reference.
//!
//! Tries progressively weaker comparisons until one succeeds, so a shallow
//! clone or a repository with a single commit still yields a (possibly
//! empty) change set instead of an error.

use hotlint_core::{to_slash, Cancellation, ChangedSet, HistoryQuery, HotlintError};
use tracing::{debug, info};

use crate::vcs::{DiffRange, VersionControl};

/// The comparisons tried, in order, for `base_ref`.
///
/// # Examples
///
/// ```
/// use hotlint_gitpulse::changeset::fallback_ranges;
///
/// assert_eq!(fallback_ranges("main").len(), 3);
/// assert_eq!(fallback_ranges("").len(), 2);
/// ```
pub fn fallback_ranges(base_ref: &str) -> Vec<DiffRange> {
    let mut ranges = Vec::with_capacity(3);
    let base = base_ref.trim();
    if !base.is_empty() {
        ranges.push(DiffRange::MergeBase { base: base.into() });
    }
    ranges.push(DiffRange::AgainstRev {
        rev: "HEAD~1".into(),
    });
    ranges.push(DiffRange::TwoDot {
        from: "HEAD^".into(),
        to: "HEAD".into(),
    });
    ranges
}

/// Resolve the set of files changed relative to `base_ref`.
///
/// The first comparison that succeeds wins. When every comparison fails and
/// the last failure is a no-history condition, returns an empty degraded set.
///
/// # Errors
///
/// Returns the last error when it is anything other than
/// [`HotlintError::NoHistory`], and [`HotlintError::Cancelled`] immediately.
pub fn resolve_changed_set<V: VersionControl + ?Sized>(
    vcs: &V,
    base_ref: &str,
    cancel: &Cancellation,
) -> Result<HistoryQuery<ChangedSet>, HotlintError> {
    let mut last_err = None;

    for range in fallback_ranges(base_ref) {
        match vcs.changed_paths(&range, cancel) {
            Ok(paths) => {
                let set: ChangedSet = paths
                    .iter()
                    .map(|p| to_slash(p.trim()))
                    .filter(|p| !p.is_empty())
                    .collect();
                debug!(range = %range, files = set.len(), "resolved change set");
                return Ok(HistoryQuery::complete(set));
            }
            Err(e @ HotlintError::Cancelled(_)) => return Err(e),
            Err(e) => {
                debug!(range = %range, error = %e, "change-set comparison failed");
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) if !e.is_no_history() => Err(e),
        _ => {
            info!("no history to compare against; ranking without changed-file bias");
            Ok(HistoryQuery::degraded())
        }
    }
}
