use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HotlintError;
use crate::types::MAX_HOTSPOTS;

/// Top-level configuration loaded from `.hotlint.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use hotlint_core::HotlintConfig;
///
/// let config = HotlintConfig::default();
/// assert_eq!(config.hotspots.since_days, 90);
/// assert!(config.hotspots.enabled);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotlintConfig {
    /// External lint/format tool settings.
    #[serde(default)]
    pub tool: ToolConfig,
    /// Hotspot ranking settings.
    #[serde(default)]
    pub hotspots: HotspotConfig,
    /// SARIF report metadata.
    #[serde(default)]
    pub report: ReportConfig,
}

impl HotlintConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HotlintError::Io`] if the file cannot be read, or
    /// [`HotlintError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use hotlint_core::HotlintConfig;
    /// use std::path::Path;
    ///
    /// let config = HotlintConfig::from_file(Path::new(".hotlint.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, HotlintError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`HotlintError::Toml`] if parsing fails, or
    /// [`HotlintError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use hotlint_core::HotlintConfig;
    ///
    /// let toml = r#"
    /// [hotspots]
    /// since_days = 30
    /// "#;
    /// let config = HotlintConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.hotspots.since_days, 30);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, HotlintError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), HotlintError> {
        if self.hotspots.limit == 0 || self.hotspots.limit > MAX_HOTSPOTS {
            return Err(HotlintError::Config(format!(
                "hotspots.limit must be between 1 and {MAX_HOTSPOTS}, got {}",
                self.hotspots.limit
            )));
        }
        if self.hotspots.output.as_os_str().is_empty() {
            return Err(HotlintError::Config(
                "hotspots.output must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// External lint/format tool invocation.
///
/// # Examples
///
/// ```
/// use hotlint_core::ToolConfig;
///
/// let config = ToolConfig::default();
/// assert_eq!(config.command, "golangci-lint");
/// assert_eq!(config.args, vec!["run".to_string()]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Program to run (looked up on `PATH`).
    #[serde(default = "default_tool_command")]
    pub command: String,
    /// Arguments passed before any extra CLI arguments.
    #[serde(default = "default_tool_args")]
    pub args: Vec<String>,
    /// Kill the tool after this many seconds (0 = no limit).
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_tool_command() -> String {
    "golangci-lint".into()
}

fn default_tool_args() -> Vec<String> {
    vec!["run".into()]
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: default_tool_command(),
            args: default_tool_args(),
            timeout_secs: 0,
        }
    }
}

/// Hotspot phase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotConfig {
    /// Run the hotspot phase after the lint tool (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base ref for the changed-file bias (empty = fall back to `HEAD~1`).
    #[serde(default)]
    pub base_ref: String,
    /// Churn window in days (default: 90).
    #[serde(default = "default_since_days")]
    pub since_days: u64,
    /// Report destination (default: `.hotlint/hotspots.sarif`).
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Deadline for the whole hotspot phase in seconds (0 = none, default: 120).
    #[serde(default = "default_hotspot_timeout")]
    pub timeout_secs: u64,
    /// Maximum number of ranked files (default and ceiling: 500).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_since_days() -> u64 {
    90
}

fn default_output() -> PathBuf {
    PathBuf::from(".hotlint/hotspots.sarif")
}

fn default_hotspot_timeout() -> u64 {
    120
}

fn default_limit() -> usize {
    MAX_HOTSPOTS
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_ref: String::new(),
            since_days: default_since_days(),
            output: default_output(),
            timeout_secs: default_hotspot_timeout(),
            limit: default_limit(),
        }
    }
}

/// Metadata written into the SARIF `tool.driver` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    #[serde(default = "default_information_uri")]
    pub information_uri: String,
}

fn default_tool_name() -> String {
    "hotlint".into()
}

fn default_information_uri() -> String {
    "https://github.com/hotlint/hotlint".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            information_uri: default_information_uri(),
        }
    }
}
