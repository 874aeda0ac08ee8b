//! Token-density complexity proxy.
//!
//! Not a cyclomatic or AST measure: tokens per line is cheap, language
//! agnostic, and good enough to separate dense code from sparse code.

use std::path::Path;

use tracing::debug;

/// Tokens per line for the file at `path`.
///
/// Returns `0.0` when the file cannot be read or is not UTF-8 text; a
/// missing signal never aborts scoring.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use hotlint_gitpulse::complexity::estimate_complexity;
///
/// let c = estimate_complexity(Path::new("src/main.rs"));
/// assert!(c >= 0.0);
/// ```
pub fn estimate_complexity(path: &Path) -> f64 {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "unreadable file scores zero complexity");
            return 0.0;
        }
    };
    match std::str::from_utf8(&bytes) {
        Ok(text) => token_density(text),
        Err(_) => {
            debug!(path = %path.display(), "non-text file scores zero complexity");
            0.0
        }
    }
}

/// Whitespace-delimited tokens divided by `newlines + 1`.
///
/// # Examples
///
/// ```
/// use hotlint_gitpulse::complexity::token_density;
///
/// assert_eq!(token_density("a b\nc d"), 2.0);
/// assert_eq!(token_density(""), 0.0);
/// ```
pub fn token_density(text: &str) -> f64 {
    let lines = text.bytes().filter(|&b| b == b'\n').count() + 1;
    let tokens = text.split_whitespace().count();
    tokens as f64 / lines.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_newline_counts_as_a_line() {
        // "x y z\n" has one newline, so two lines.
        assert_eq!(token_density("x y z\n"), 1.5);
    }

    #[test]
    fn whitespace_only_is_zero() {
        assert_eq!(token_density("   \n\t\n"), 0.0);
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package main\n\nfunc main() {}\n").unwrap();
        // 5 tokens over 4 lines
        assert_eq!(estimate_complexity(&path), 1.25);
    }

    #[test]
    fn missing_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(estimate_complexity(&dir.path().join("gone.go")), 0.0);
    }

    #[test]
    fn directory_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(estimate_complexity(dir.path()), 0.0);
    }

    #[test]
    fn binary_content_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x81, 0x0a]).unwrap();
        assert_eq!(estimate_complexity(&path), 0.0);
    }

    #[test]
    fn estimation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.go");
        std::fs::write(&path, "func a() int { return 1 }\nfunc b() {}\n").unwrap();
        let first = estimate_complexity(&path);
        let second = estimate_complexity(&path);
        assert_eq!(first, second);
        assert!(first > 0.0);
    }
}
