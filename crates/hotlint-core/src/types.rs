use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound on the number of ranked hotspots emitted per run.
pub const MAX_HOTSPOTS: usize = 500;

/// Per-file churn (added + deleted lines) keyed by repo-relative path.
pub type ChurnTable = HashMap<String, u64>;

/// Paths that differ from the base ref. Used as a ranking bias only.
pub type ChangedSet = HashSet<String>;

/// A file ranked by churn and complexity.
///
/// # Examples
///
/// ```
/// use hotlint_core::Hotspot;
///
/// let h = Hotspot {
///     file: "cmd/server/main.go".into(),
///     churn: 42,
///     complexity: 3.5,
///     score: 3.76,
/// };
/// assert!(h.churn > 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Repo-relative path with forward slashes.
    pub file: String,
    /// Total lines added + deleted across the analysed history.
    pub churn: u64,
    /// Tokens per line; 0 when the file could not be read.
    pub complexity: f64,
    /// Composite score. Can be negative when complexity is far below the mean.
    pub score: f64,
}

/// Result of a history query that tolerates missing history.
///
/// `degraded` is set when the repository had no usable history for the
/// query (no commits yet, unknown ref, shallow clone) and `value` is empty
/// because of it.
///
/// # Examples
///
/// ```
/// use hotlint_core::{ChurnTable, HistoryQuery};
///
/// let q: HistoryQuery<ChurnTable> = HistoryQuery::degraded();
/// assert!(q.degraded);
/// assert!(q.value.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> HistoryQuery<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }
}

impl<T: Default> HistoryQuery<T> {
    pub fn degraded() -> Self {
        Self {
            value: T::default(),
            degraded: true,
        }
    }
}

/// Normalize a path to forward slashes regardless of host convention.
///
/// # Examples
///
/// ```
/// use hotlint_core::to_slash;
///
/// assert_eq!(to_slash(r"pkg\api\handler.go"), "pkg/api/handler.go");
/// assert_eq!(to_slash("./pkg/api.go"), "pkg/api.go");
/// ```
pub fn to_slash(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    match normalized.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => normalized,
    }
}

/// Output format for terminal summaries.
///
/// # Examples
///
/// ```
/// use hotlint_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
