//! Version-control queries.
//!
//! [`VersionControl`] is the seam between the hotspot engine and git. The
//! production implementation, [`GitCli`], shells out to `git` and classifies
//! failures at this boundary: "no history yet / unknown ref" conditions come
//! back as [`HotlintError::NoHistory`], everything else as
//! [`HotlintError::Git`].

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, TimeDelta, Utc};
use git2::Repository;
use hotlint_core::{Cancellation, HotlintError};
use tracing::debug;

/// Stderr phrases git prints when the repository lacks the history a query
/// needs. Matched case-insensitively; git runs with `LC_ALL=C`.
const NO_HISTORY_PATTERNS: &[&str] = &[
    "does not have any commits yet",
    "unknown revision",
    "ambiguous argument",
    "bad revision",
    "bad default revision",
    "not a valid object name",
    "needed a single revision",
    "invalid revision range",
    "no merge base",
    "shallow",
];

/// Which two trees a changed-path query compares.
///
/// # Examples
///
/// ```
/// use hotlint_gitpulse::vcs::DiffRange;
///
/// let range = DiffRange::MergeBase { base: "origin/main".into() };
/// assert_eq!(range.to_string(), "origin/main...HEAD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffRange {
    /// `base...HEAD`: changes on HEAD since it diverged from `base`.
    MergeBase { base: String },
    /// Working tree against `rev`.
    AgainstRev { rev: String },
    /// `from..to`: plain tree-to-tree diff.
    TwoDot { from: String, to: String },
}

impl DiffRange {
    fn spec(&self) -> String {
        match self {
            DiffRange::MergeBase { base } => format!("{base}...HEAD"),
            DiffRange::AgainstRev { rev } => rev.clone(),
            DiffRange::TwoDot { from, to } => format!("{from}..{to}"),
        }
    }
}

impl fmt::Display for DiffRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec())
    }
}

/// Time bound for churn queries.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use hotlint_gitpulse::vcs::ChurnWindow;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
/// let window = ChurnWindow { since_days: 30 };
/// assert_eq!(window.since_arg(now).as_deref(), Some("--since=2024-03-01T12:00:00Z"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChurnWindow {
    pub since_days: u64,
}

impl ChurnWindow {
    /// The `--since=` argument for a window ending at `now`, or `None` when
    /// the window reaches back further than a timestamp can express.
    pub fn since_arg(&self, now: DateTime<Utc>) -> Option<String> {
        let days = i64::try_from(self.since_days).ok()?;
        let cutoff = now.checked_sub_signed(TimeDelta::try_days(days)?)?;
        Some(format!("--since={}", cutoff.format("%Y-%m-%dT%H:%M:%SZ")))
    }
}

/// Read-only history queries the hotspot engine needs.
pub trait VersionControl {
    /// Paths (repo-relative) that differ across `range`.
    fn changed_paths(
        &self,
        range: &DiffRange,
        cancel: &Cancellation,
    ) -> Result<Vec<String>, HotlintError>;

    /// Raw `--numstat` log output: one `added<TAB>removed<TAB>path` row per
    /// file per commit. `window = None` covers all of HEAD's history.
    fn numstat_log(
        &self,
        window: Option<&ChurnWindow>,
        cancel: &Cancellation,
    ) -> Result<String, HotlintError>;
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    /// Use `repo_root` as-is (must be a working tree root).
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Find the working tree containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HotlintError::Git`] if `path` is not inside a git working
    /// tree (bare repositories included).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use hotlint_gitpulse::vcs::GitCli;
    ///
    /// let git = GitCli::discover(Path::new(".")).unwrap();
    /// println!("{}", git.repo_root().display());
    /// ```
    pub fn discover(path: &Path) -> Result<Self, HotlintError> {
        let repo = Repository::discover(path)
            .map_err(|e| HotlintError::Git(format!("failed to open repository: {e}")))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| HotlintError::Git("repository has no working tree".into()))?;
        Ok(Self::new(workdir))
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn run(&self, args: &[String], cancel: &Cancellation) -> Result<String, HotlintError> {
        let rendered = args.join(" ");
        if cancel.is_cancelled() {
            return Err(HotlintError::Cancelled(format!(
                "git {rendered}: {}",
                cancel.reason()
            )));
        }
        debug!(repo = %self.repo_root.display(), "git {rendered}");

        let mut child = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(["-c", "core.quotePath=false"])
            .args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HotlintError::Git(format!("failed to run git: {e}")))?;

        // Drain both pipes while waiting so large logs cannot block the child.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = cancel.wait(&mut child, &format!("git {rendered}"))?;

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            return Err(classify_failure(&rendered, &stderr));
        }
        Ok(stdout)
    }
}

impl VersionControl for GitCli {
    fn changed_paths(
        &self,
        range: &DiffRange,
        cancel: &Cancellation,
    ) -> Result<Vec<String>, HotlintError> {
        let args = vec!["diff".into(), "--name-only".into(), range.spec()];
        let out = self.run(&args, cancel)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn numstat_log(
        &self,
        window: Option<&ChurnWindow>,
        cancel: &Cancellation,
    ) -> Result<String, HotlintError> {
        let mut args: Vec<String> = vec![
            "log".into(),
            "--numstat".into(),
            "--format=".into(),
            "--no-renames".into(),
        ];
        if let Some(since) = window.and_then(|w| w.since_arg(Utc::now())) {
            args.push(since);
        }
        args.push("HEAD".into());
        self.run(&args, cancel)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle.and_then(|h| h.join().ok()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Turn a failed git invocation into the matching error kind.
pub(crate) fn classify_failure(command: &str, stderr: &str) -> HotlintError {
    let lowered = stderr.to_lowercase();
    let detail = stderr.trim();
    if NO_HISTORY_PATTERNS.iter().any(|p| lowered.contains(p)) {
        HotlintError::NoHistory(format!("git {command}: {detail}"))
    } else {
        HotlintError::Git(format!("git {command} failed: {detail}"))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// Canned reply for one scripted query.
    #[derive(Debug, Clone)]
    pub(crate) enum Reply {
        Out(String),
        NoHistory,
        Fail,
    }

    impl Reply {
        pub(crate) fn out(s: &str) -> Self {
            Reply::Out(s.to_string())
        }

        fn into_result(self) -> Result<String, HotlintError> {
            match self {
                Reply::Out(s) => Ok(s),
                Reply::NoHistory => Err(HotlintError::NoHistory(
                    "fatal: ambiguous argument 'HEAD~1'".into(),
                )),
                Reply::Fail => Err(HotlintError::Git("fatal: index file corrupt".into())),
            }
        }
    }

    /// A [`VersionControl`] that answers from fixed replies and records the
    /// order of queries.
    #[derive(Debug)]
    pub(crate) struct ScriptedVcs {
        pub merge_base: Reply,
        pub against_rev: Reply,
        pub two_dot: Reply,
        pub windowed_log: Reply,
        pub full_log: Reply,
        pub calls: RefCell<Vec<String>>,
    }

    impl Default for ScriptedVcs {
        fn default() -> Self {
            Self {
                merge_base: Reply::NoHistory,
                against_rev: Reply::NoHistory,
                two_dot: Reply::NoHistory,
                windowed_log: Reply::NoHistory,
                full_log: Reply::NoHistory,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl VersionControl for ScriptedVcs {
        fn changed_paths(
            &self,
            range: &DiffRange,
            _cancel: &Cancellation,
        ) -> Result<Vec<String>, HotlintError> {
            self.calls.borrow_mut().push(range.to_string());
            let reply = match range {
                DiffRange::MergeBase { .. } => self.merge_base.clone(),
                DiffRange::AgainstRev { .. } => self.against_rev.clone(),
                DiffRange::TwoDot { .. } => self.two_dot.clone(),
            };
            reply
                .into_result()
                .map(|out| out.lines().map(String::from).collect())
        }

        fn numstat_log(
            &self,
            window: Option<&ChurnWindow>,
            _cancel: &Cancellation,
        ) -> Result<String, HotlintError> {
            match window {
                Some(_) => {
                    self.calls.borrow_mut().push("log --since".into());
                    self.windowed_log.clone().into_result()
                }
                None => {
                    self.calls.borrow_mut().push("log".into());
                    self.full_log.clone().into_result()
                }
            }
        }
    }
}
