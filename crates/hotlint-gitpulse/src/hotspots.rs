//! Churn × complexity hotspot ranking.
//!
//! Complexity is z-score normalized within the run, so a file's score moves
//! above or below its churn baseline depending on how dense it is relative
//! to the other churned files. Files changed against the base ref get a
//! small bias so they edge out similar dormant files.

use std::cmp::Ordering;
use std::path::Path;

use hotlint_core::{
    Cancellation, ChangedSet, ChurnTable, HistoryQuery, HotlintError, Hotspot, MAX_HOTSPOTS,
};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::changeset::resolve_changed_set;
use crate::churn::aggregate_churn;
use crate::complexity::estimate_complexity;
use crate::vcs::{ChurnWindow, VersionControl};

/// Score multiplier for files in the change set.
pub const CHANGED_FILE_BIAS: f64 = 1.15;

/// Inputs for one hotspot run.
///
/// # Examples
///
/// ```
/// use hotlint_gitpulse::hotspots::HotspotOptions;
///
/// let opts = HotspotOptions::default();
/// assert_eq!(opts.since_days, 90);
/// assert_eq!(opts.limit, 500);
/// assert!(opts.base_ref.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct HotspotOptions {
    /// Base ref for the changed-file bias. Empty means "previous commit".
    pub base_ref: String,
    /// Churn window in days.
    pub since_days: u64,
    /// Maximum hotspots returned; clamped to [`MAX_HOTSPOTS`].
    pub limit: usize,
}

impl Default for HotspotOptions {
    fn default() -> Self {
        Self {
            base_ref: String::new(),
            since_days: 90,
            limit: MAX_HOTSPOTS,
        }
    }
}

/// Ranked hotspots plus how the history queries went.
#[derive(Debug, Clone, Default)]
pub struct HotspotRun {
    /// Sorted by score descending, ties by path.
    pub hotspots: Vec<Hotspot>,
    /// Files with churn, including ones no longer on disk.
    pub churned_files: usize,
    /// The change set was empty because there was no history to compare.
    pub changes_degraded: bool,
    /// The churn table was empty because the repository had no history.
    pub churn_degraded: bool,
}

impl HotspotRun {
    pub fn degraded(&self) -> bool {
        self.changes_degraded || self.churn_degraded
    }
}

/// One churned file that still exists, before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSample {
    pub file: String,
    pub churn: u64,
    pub complexity: f64,
}

/// Mean and population standard deviation of complexity in one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl ComplexityStats {
    /// # Examples
    ///
    /// ```
    /// use hotlint_gitpulse::hotspots::ComplexityStats;
    ///
    /// let stats = ComplexityStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    /// assert_eq!(stats.mean, 5.0);
    /// assert_eq!(stats.std_dev, 2.0);
    /// ```
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// `(value - mean) / std_dev`, or `0.0` when every value is identical.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std_dev == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

/// `ln(1 + churn) × (1 + z)`. Negative when `z < -1`.
pub fn base_score(churn: u64, z: f64) -> f64 {
    (1.0 + churn as f64).ln() * (1.0 + z)
}

/// Score, sort, and truncate sampled files.
///
/// Sorting is by score descending with ties broken by ascending path, so
/// the output never depends on map iteration order.
///
/// # Examples
///
/// ```
/// use hotlint_core::ChangedSet;
/// use hotlint_gitpulse::hotspots::{rank_hotspots, FileSample};
///
/// let samples = vec![
///     FileSample { file: "b.go".into(), churn: 1, complexity: 2.0 },
///     FileSample { file: "a.go".into(), churn: 10, complexity: 2.0 },
/// ];
/// let ranked = rank_hotspots(samples, &ChangedSet::new(), 500);
/// assert_eq!(ranked[0].file, "a.go");
/// assert!((ranked[0].score - 11f64.ln()).abs() < 1e-12);
/// ```
pub fn rank_hotspots(samples: Vec<FileSample>, changed: &ChangedSet, limit: usize) -> Vec<Hotspot> {
    let complexities: Vec<f64> = samples.iter().map(|s| s.complexity).collect();
    let stats = ComplexityStats::from_values(&complexities);
    debug!(mean = stats.mean, std_dev = stats.std_dev, files = samples.len(), "complexity stats");

    let mut hotspots: Vec<Hotspot> = samples
        .into_iter()
        .map(|s| {
            let mut score = base_score(s.churn, stats.z_score(s.complexity));
            if changed.contains(&s.file) {
                score *= CHANGED_FILE_BIAS;
            }
            Hotspot {
                file: s.file,
                churn: s.churn,
                complexity: s.complexity,
                score,
            }
        })
        .collect();

    hotspots.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.file.cmp(&b.file))
    });
    hotspots.truncate(limit.min(MAX_HOTSPOTS));
    hotspots
}

/// Estimate complexity for every churned file that still exists under
/// `repo_root`. Files gone from disk are dropped.
pub fn sample_files(repo_root: &Path, churn: &ChurnTable) -> Vec<FileSample> {
    let mut entries: Vec<(&String, &u64)> = churn.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    entries
        .into_par_iter()
        .filter_map(|(file, churn)| {
            let full_path = repo_root.join(file);
            if !full_path.is_file() {
                return None;
            }
            Some(FileSample {
                file: file.clone(),
                churn: *churn,
                complexity: estimate_complexity(&full_path),
            })
        })
        .collect()
}

/// Run the full pipeline: resolve changes, aggregate churn, estimate
/// complexity, and rank.
///
/// A change-set failure only costs the changed-file bias; it is logged and
/// the run continues.
///
/// # Errors
///
/// Returns an error when churn cannot be aggregated for a reason other than
/// missing history, or when `cancel` fires during a git query.
///
/// # Examples
///
/// ```no_run
/// use hotlint_core::Cancellation;
/// use hotlint_gitpulse::hotspots::{compute_hotspots, HotspotOptions};
/// use hotlint_gitpulse::vcs::GitCli;
///
/// let git = GitCli::discover(std::path::Path::new(".")).unwrap();
/// let opts = HotspotOptions::default();
/// let run = compute_hotspots(&git, git.repo_root(), &opts, &Cancellation::new()).unwrap();
/// for h in run.hotspots.iter().take(5) {
///     println!("{}: score={:.2}, churn={}", h.file, h.score, h.churn);
/// }
/// ```
pub fn compute_hotspots<V: VersionControl + ?Sized>(
    vcs: &V,
    repo_root: &Path,
    options: &HotspotOptions,
    cancel: &Cancellation,
) -> Result<HotspotRun, HotlintError> {
    let changes = match resolve_changed_set(vcs, &options.base_ref, cancel) {
        Ok(q) => q,
        Err(e @ HotlintError::Cancelled(_)) => return Err(e),
        Err(e) => {
            warn!(error = %e, "could not resolve changed files; ranking without bias");
            HistoryQuery::complete(ChangedSet::new())
        }
    };

    let window = ChurnWindow {
        since_days: options.since_days,
    };
    let churn = aggregate_churn(vcs, &window, cancel)?;

    let samples = sample_files(repo_root, &churn.value);
    debug!(
        churned = churn.value.len(),
        on_disk = samples.len(),
        changed = changes.value.len(),
        "scoring hotspots"
    );

    Ok(HotspotRun {
        hotspots: rank_hotspots(samples, &changes.value, options.limit),
        churned_files: churn.value.len(),
        changes_degraded: changes.degraded,
        churn_degraded: churn.degraded,
    })
}
