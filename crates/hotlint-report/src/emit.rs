//! Report persistence with permission-aware redirection.
//!
//! The report file must exist after every successful hotspot run, even an
//! empty one. When the destination cannot be written because of permissions
//! or a read-only filesystem, the report goes to a temp directory instead
//! under the same file name.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use hotlint_core::HotlintError;
use tracing::{debug, info};

use crate::sarif::SarifLog;

const DEFAULT_FILE_NAME: &str = "hotspots.sarif";

/// Filesystem operations the emitter needs.
pub trait FileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Where a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub path: PathBuf,
    /// `true` when the requested destination was not writable.
    pub redirected: bool,
    pub results: usize,
}

/// `true` for the failures that trigger redirection.
pub fn is_permission_denied(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::PermissionDenied | ErrorKind::ReadOnlyFilesystem
    )
}

/// Directory used when the requested destination is not writable.
pub fn fallback_dir() -> PathBuf {
    std::env::temp_dir().join("hotlint")
}

/// Write `log` to `destination`, redirecting to [`fallback_dir`] on
/// permission errors.
///
/// # Errors
///
/// Returns [`HotlintError::Serialization`] if the log cannot be encoded and
/// [`HotlintError::Io`] for any write failure that is not a permission
/// problem, or when the fallback location fails too.
///
/// # Examples
///
/// ```
/// use hotlint_core::ReportConfig;
/// use hotlint_report::emit::{emit_report, StdFileSystem};
/// use hotlint_report::sarif::to_sarif;
///
/// let dir = tempfile::tempdir().unwrap();
/// let dest = dir.path().join("out/hotspots.sarif");
/// let log = to_sarif(&[], &ReportConfig::default());
/// let emitted = emit_report(&StdFileSystem, &log, &dest).unwrap();
/// assert_eq!(emitted.path, dest);
/// assert!(!emitted.redirected);
/// assert!(dest.exists());
/// ```
pub fn emit_report<F: FileSystem + ?Sized>(
    fs: &F,
    log: &SarifLog,
    destination: &Path,
) -> Result<Emitted, HotlintError> {
    emit_report_with_fallback(fs, log, destination, &fallback_dir())
}

/// [`emit_report`] with an explicit fallback directory.
pub fn emit_report_with_fallback<F: FileSystem + ?Sized>(
    fs: &F,
    log: &SarifLog,
    destination: &Path,
    fallback: &Path,
) -> Result<Emitted, HotlintError> {
    let body = log.to_json_pretty()?;
    let results = log.runs.iter().map(|r| r.results.len()).sum();

    match write_into(fs, destination, body.as_bytes()) {
        Ok(()) => {
            debug!(path = %destination.display(), results, "wrote report");
            Ok(Emitted {
                path: destination.to_path_buf(),
                redirected: false,
                results,
            })
        }
        Err(e) if is_permission_denied(&e) => {
            let file_name = destination
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));
            let redirected = fallback.join(file_name);
            info!(
                requested = %destination.display(),
                path = %redirected.display(),
                error = %e,
                "report destination not writable; writing to temp directory"
            );
            write_into(fs, &redirected, body.as_bytes())
                .map_err(|e| with_path(e, &redirected))?;
            Ok(Emitted {
                path: redirected,
                redirected: true,
                results,
            })
        }
        Err(e) => Err(with_path(e, destination)),
    }
}

fn write_into<F: FileSystem + ?Sized>(fs: &F, path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs.create_dir_all(parent)?;
    }
    fs.write(path, contents)
}

fn with_path(err: io::Error, path: &Path) -> HotlintError {
    HotlintError::Io(io::Error::new(
        err.kind(),
        format!("writing report to {}: {err}", path.display()),
    ))
}
