/// Errors that can occur across hotlint.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate reports it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use hotlint_core::HotlintError;
///
/// let err = HotlintError::Config("missing tool command".into());
/// assert!(err.to_string().contains("missing tool command"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum HotlintError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check .hotlint.toml or run 'hotlint init' for a template"))]
    Config(String),

    /// Git operation failure that has no safe empty-result interpretation.
    #[error("git error: {0}")]
    Git(String),

    /// The repository has no usable history for the query: no commits yet,
    /// an unknown ref, or a clone too shallow to reach the requested revision.
    ///
    /// Callers treat this as a degraded condition, not a failure.
    #[error("no history: {0}")]
    NoHistory(String),

    /// An external call was cancelled or ran past its deadline.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The configured lint tool binary could not be found.
    #[error("tool not found: {0}")]
    #[diagnostic(help("install the tool or set [tool] command in .hotlint.toml"))]
    ToolNotFound(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl HotlintError {
    /// Returns `true` for the degraded "no history yet / unknown ref" kind.
    pub fn is_no_history(&self) -> bool {
        matches!(self, HotlintError::NoHistory(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HotlintError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = HotlintError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    /// Exhaustive on purpose: a new variant must be given a display prefix here.
    fn prefix(err: &HotlintError) -> &'static str {
        match err {
            HotlintError::Io(_) => "IO error",
            HotlintError::Config(_) => "configuration error",
            HotlintError::Git(_) => "git error",
            HotlintError::NoHistory(_) => "no history",
            HotlintError::Cancelled(_) => "cancelled",
            HotlintError::ToolNotFound(_) => "tool not found",
            HotlintError::Serialization(_) => "serialization error",
            HotlintError::Toml(_) => "TOML parse error",
        }
    }

    #[test]
    fn every_variant_displays_its_prefix() {
        let errors = vec![
            HotlintError::Io(std::io::Error::other("disk")),
            HotlintError::Config("limit".into()),
            HotlintError::Git("fatal".into()),
            HotlintError::NoHistory("unknown revision".into()),
            HotlintError::Cancelled("deadline".into()),
            HotlintError::ToolNotFound("golangci-lint".into()),
            HotlintError::Serialization(serde_json::from_str::<u8>("x").unwrap_err()),
            HotlintError::Toml(toml::from_str::<toml::Table>("=").unwrap_err()),
        ];
        for err in &errors {
            assert!(err.to_string().starts_with(prefix(err)), "{err}");
        }
    }

    #[test]
    fn only_no_history_is_degraded() {
        assert!(HotlintError::NoHistory("unknown revision".into()).is_no_history());
        assert!(!HotlintError::Git("fatal: corrupt object".into()).is_no_history());
        assert!(!HotlintError::Cancelled("deadline".into()).is_no_history());
    }
}
