//! Per-phase outcomes and the hotspot phase.
//!
//! A failed lint phase decides the exit status. The hotspot phase is
//! advisory: its failures become warnings and never change the exit status.

use std::path::{Path, PathBuf};

use hotlint_core::{Cancellation, HotlintError, ReportConfig};
use hotlint_gitpulse::hotspots::{compute_hotspots, HotspotOptions, HotspotRun};
use hotlint_gitpulse::vcs::GitCli;
use hotlint_report::emit::{emit_report, Emitted, StdFileSystem};
use hotlint_report::sarif::to_sarif;
use tracing::{info, warn};

use crate::tool::{run_tool, ToolSpec};

/// Exit code when the lint tool is not installed.
pub const TOOL_NOT_FOUND_EXIT_CODE: i32 = 127;
/// Exit code when the lint tool was killed at its deadline.
pub const TOOL_TIMEOUT_EXIT_CODE: i32 = 124;

pub const LINT_PHASE: &str = "lint";
pub const HOTSPOT_PHASE: &str = "hotspots";

/// How one phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseStatus {
    Passed,
    /// Decides the process exit status.
    Failed { exit_code: i32, message: String },
    /// Reported to the user but does not affect the exit status.
    Warned { message: String },
    Skipped,
}

/// A named phase and its status.
///
/// # Examples
///
/// ```
/// use hotlint_runner::phase::{aggregate_exit_code, PhaseOutcome};
///
/// let outcomes = vec![
///     PhaseOutcome::failed("lint", 2, "lint tool reported issues"),
///     PhaseOutcome::warned("hotspots", "git error: corrupt object"),
/// ];
/// assert_eq!(aggregate_exit_code(&outcomes), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub name: &'static str,
    pub status: PhaseStatus,
}

impl PhaseOutcome {
    pub fn passed(name: &'static str) -> Self {
        Self {
            name,
            status: PhaseStatus::Passed,
        }
    }

    pub fn failed(name: &'static str, exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            name,
            status: PhaseStatus::Failed {
                exit_code,
                message: message.into(),
            },
        }
    }

    pub fn warned(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: PhaseStatus::Warned {
                message: message.into(),
            },
        }
    }

    pub fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: PhaseStatus::Skipped,
        }
    }
}

/// Exit code of the first failed phase, or `0`.
pub fn aggregate_exit_code(outcomes: &[PhaseOutcome]) -> i32 {
    outcomes
        .iter()
        .find_map(|o| match o.status {
            PhaseStatus::Failed { exit_code, .. } => Some(exit_code),
            _ => None,
        })
        .unwrap_or(0)
}

/// Run the lint tool and classify the result.
pub fn lint_phase(spec: &ToolSpec, cwd: &Path, cancel: &Cancellation) -> PhaseOutcome {
    match run_tool(spec, cwd, cancel) {
        Ok(outcome) if outcome.success() => PhaseOutcome::passed(LINT_PHASE),
        Ok(outcome) => PhaseOutcome::failed(
            LINT_PHASE,
            outcome.exit_code,
            format!("{} exited with status {}", spec.command, outcome.exit_code),
        ),
        Err(e @ HotlintError::ToolNotFound(_)) => {
            PhaseOutcome::failed(LINT_PHASE, TOOL_NOT_FOUND_EXIT_CODE, e.to_string())
        }
        Err(e @ HotlintError::Cancelled(_)) => {
            PhaseOutcome::failed(LINT_PHASE, TOOL_TIMEOUT_EXIT_CODE, e.to_string())
        }
        Err(e) => PhaseOutcome::failed(LINT_PHASE, 1, e.to_string()),
    }
}

/// Inputs for the hotspot phase.
#[derive(Debug, Clone)]
pub struct HotspotPhase {
    /// Any path inside the repository.
    pub repo_path: PathBuf,
    pub options: HotspotOptions,
    /// Report destination; relative paths resolve against the repository root.
    pub output: PathBuf,
    pub report: ReportConfig,
}

/// A completed hotspot phase.
#[derive(Debug, Clone)]
pub struct HotspotReport {
    pub run: HotspotRun,
    pub emitted: Emitted,
}

impl HotspotPhase {
    /// Compute hotspots and write the SARIF report.
    ///
    /// # Errors
    ///
    /// Returns an error when the repository cannot be opened, churn cannot
    /// be aggregated, `cancel` fires, or the report cannot be written even
    /// at the fallback location.
    pub fn run(&self, cancel: &Cancellation) -> Result<HotspotReport, HotlintError> {
        let git = GitCli::discover(&self.repo_path)?;
        let run = compute_hotspots(&git, git.repo_root(), &self.options, cancel)?;
        if run.degraded() {
            info!(
                changes_degraded = run.changes_degraded,
                churn_degraded = run.churn_degraded,
                "hotspot history degraded"
            );
        }

        let destination = if self.output.is_absolute() {
            self.output.clone()
        } else {
            git.repo_root().join(&self.output)
        };
        let log = to_sarif(&run.hotspots, &self.report);
        let emitted = emit_report(&StdFileSystem, &log, &destination)?;

        Ok(HotspotReport { run, emitted })
    }
}

/// Classify a hotspot phase result. Errors only ever warn.
pub fn hotspot_outcome(result: &Result<HotspotReport, HotlintError>) -> PhaseOutcome {
    match result {
        Ok(_) => PhaseOutcome::passed(HOTSPOT_PHASE),
        Err(e) => {
            warn!(error = %e, "hotspot phase failed");
            PhaseOutcome::warned(HOTSPOT_PHASE, e.to_string())
        }
    }
}
