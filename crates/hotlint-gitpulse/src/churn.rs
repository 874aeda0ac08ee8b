//! Per-file churn aggregation from `git log --numstat`.

use hotlint_core::{to_slash, Cancellation, ChurnTable, HistoryQuery, HotlintError};
use tracing::{debug, info, warn};

use crate::vcs::{ChurnWindow, VersionControl};

/// Churn credited to one commit's change of a binary file, for which git
/// reports no line counts.
pub const BINARY_CHANGE_CHURN: u64 = 1;

/// Sum added + removed lines per file across history.
///
/// Queries the `window` first and widens to all of HEAD's history only when
/// that query fails. A window with no commits yields an empty table. A
/// repository without history yields an empty, degraded table.
///
/// # Errors
///
/// Returns the last error when every query failed for a reason other than
/// missing history. This is the one failure that aborts hotspot computation.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use hotlint_core::Cancellation;
/// use hotlint_gitpulse::churn::aggregate_churn;
/// use hotlint_gitpulse::vcs::{ChurnWindow, GitCli};
///
/// let git = GitCli::discover(Path::new(".")).unwrap();
/// let window = ChurnWindow { since_days: 90 };
/// let churn = aggregate_churn(&git, &window, &Cancellation::new()).unwrap();
/// println!("{} files churned", churn.value.len());
/// ```
pub fn aggregate_churn<V: VersionControl + ?Sized>(
    vcs: &V,
    window: &ChurnWindow,
    cancel: &Cancellation,
) -> Result<HistoryQuery<ChurnTable>, HotlintError> {
    let attempts = [Some(window), None];
    let mut last_err = None;

    for attempt in attempts {
        match vcs.numstat_log(attempt, cancel) {
            Ok(raw) => {
                let table = parse_numstat(&raw);
                debug!(files = table.len(), windowed = attempt.is_some(), "aggregated churn");
                return Ok(HistoryQuery::complete(table));
            }
            Err(e @ HotlintError::Cancelled(_)) => return Err(e),
            Err(e) => {
                if attempt.is_some() {
                    warn!(error = %e, "windowed churn query failed; retrying over full history");
                } else {
                    debug!(error = %e, "full-history churn query failed");
                }
                last_err = Some(e);
            }
        }
    }

    match last_err {
        None => Ok(HistoryQuery::complete(ChurnTable::new())),
        Some(e) if e.is_no_history() => {
            info!("repository has no history yet; churn table is empty");
            Ok(HistoryQuery::degraded())
        }
        Some(e) => Err(e),
    }
}

/// Parse `--numstat --format=` output into a churn table.
///
/// Rows are `added<TAB>removed<TAB>path`. A binary file reports `-` for both
/// counts and is credited [`BINARY_CHANGE_CHURN`] for that commit. Malformed
/// rows are skipped.
///
/// # Examples
///
/// ```
/// use hotlint_gitpulse::churn::parse_numstat;
///
/// let raw = "3\t1\tmain.go\n-\t-\tlogo.png\n\n2\t0\tmain.go\n";
/// let table = parse_numstat(raw);
/// assert_eq!(table["main.go"], 6);
/// assert_eq!(table["logo.png"], 1);
/// ```
pub fn parse_numstat(raw: &str) -> ChurnTable {
    let mut table = ChurnTable::new();

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.splitn(3, '\t');
        let (Some(added), Some(removed), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            debug!(row = line, "skipping malformed numstat row");
            continue;
        };

        let Some(delta) = row_churn(added.trim(), removed.trim()) else {
            debug!(row = line, "skipping numstat row with invalid counts");
            continue;
        };

        let path = to_slash(path.trim());
        if path.is_empty() {
            continue;
        }

        let entry = table.entry(path).or_insert(0);
        *entry = entry.saturating_add(delta);
    }

    table
}

fn row_churn(added: &str, removed: &str) -> Option<u64> {
    if added == "-" || removed == "-" {
        return Some(BINARY_CHANGE_CHURN);
    }
    let added: u64 = added.parse().ok()?;
    let removed: u64 = removed.parse().ok()?;
    Some(added.saturating_add(removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::testing::{Reply, ScriptedVcs};

    const WINDOW: ChurnWindow = ChurnWindow { since_days: 90 };

    #[test]
    fn sums_across_commits() {
        let raw = "10\t2\ta.go\n1\t1\tb.go\n\n5\t0\ta.go\n";
        let table = parse_numstat(raw);
        assert_eq!(table.len(), 2);
        assert_eq!(table["a.go"], 17);
        assert_eq!(table["b.go"], 2);
    }

    #[test]
    fn binary_rows_count_once_per_commit() {
        let raw = "-\t-\tassets/logo.png\n\n-\t-\tassets/logo.png\n\n-\t-\tassets/logo.png\n";
        let table = parse_numstat(raw);
        assert_eq!(table["assets/logo.png"], 3);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let raw = "garbage\n1\ttwo\tc.go\n4\t4\n3\t3\td.go\n";
        let table = parse_numstat(raw);
        assert_eq!(table.len(), 1);
        assert_eq!(table["d.go"], 6);
    }

    #[test]
    fn paths_with_spaces_and_crlf() {
        let raw = "1\t0\tdocs/release notes.md\r\n";
        let table = parse_numstat(raw);
        assert_eq!(table["docs/release notes.md"], 1);
    }

    #[test]
    fn zero_line_changes_keep_the_file() {
        let table = parse_numstat("0\t0\tempty.go\n");
        assert_eq!(table["empty.go"], 0);
    }

    #[test]
    fn windowed_query_used_when_it_has_data() {
        let vcs = ScriptedVcs {
            windowed_log: Reply::out("1\t1\ta.go\n"),
            full_log: Reply::out("100\t100\ta.go\n"),
            ..ScriptedVcs::default()
        };
        let q = aggregate_churn(&vcs, &WINDOW, &Cancellation::new()).unwrap();
        assert!(!q.degraded);
        assert_eq!(q.value["a.go"], 2);
        assert_eq!(*vcs.calls.borrow(), vec!["log --since"]);
    }

    #[test]
    fn empty_window_stays_empty() {
        let vcs = ScriptedVcs {
            windowed_log: Reply::out(""),
            full_log: Reply::out("4\t1\told.go\n"),
            ..ScriptedVcs::default()
        };
        let q = aggregate_churn(&vcs, &WINDOW, &Cancellation::new()).unwrap();
        assert!(!q.degraded);
        assert!(q.value.is_empty());
        assert_eq!(*vcs.calls.borrow(), vec!["log --since"]);
    }

    #[test]
    fn failed_window_falls_back() {
        let vcs = ScriptedVcs {
            windowed_log: Reply::Fail,
            full_log: Reply::out("2\t2\ta.go\n"),
            ..ScriptedVcs::default()
        };
        let q = aggregate_churn(&vcs, &WINDOW, &Cancellation::new()).unwrap();
        assert!(!q.degraded);
        assert_eq!(q.value["a.go"], 4);
    }

    #[test]
    fn no_history_is_degraded() {
        let vcs = ScriptedVcs::default();
        let q = aggregate_churn(&vcs, &WINDOW, &Cancellation::new()).unwrap();
        assert!(q.degraded);
        assert!(q.value.is_empty());
    }

    #[test]
    fn unexplained_failure_aborts() {
        let vcs = ScriptedVcs {
            windowed_log: Reply::Fail,
            full_log: Reply::Fail,
            ..ScriptedVcs::default()
        };
        let err = aggregate_churn(&vcs, &WINDOW, &Cancellation::new()).unwrap_err();
        assert!(matches!(err, HotlintError::Git(_)));
    }

    #[test]
    fn empty_full_history_after_failed_window_is_not_degraded() {
        let vcs = ScriptedVcs {
            windowed_log: Reply::Fail,
            full_log: Reply::out(""),
            ..ScriptedVcs::default()
        };
        let q = aggregate_churn(&vcs, &WINDOW, &Cancellation::new()).unwrap();
        assert!(!q.degraded);
        assert!(q.value.is_empty());
    }
}
