//! External lint/format tool invocation.
//!
//! The tool inherits the terminal so its findings stream straight to the
//! user. Only the exit status is captured.

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use hotlint_core::{Cancellation, HotlintError, ToolConfig};
use tracing::debug;

/// Exit code reported when the tool was terminated by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = 1;

/// Command line for one tool run.
///
/// # Examples
///
/// ```
/// use hotlint_core::ToolConfig;
/// use hotlint_runner::tool::ToolSpec;
///
/// let spec = ToolSpec::from_config(&ToolConfig::default(), &["./...".to_string()]);
/// assert_eq!(spec.command, "golangci-lint");
/// assert_eq!(spec.args, vec!["run", "./..."]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub command: String,
    pub args: Vec<String>,
}

impl ToolSpec {
    /// Configured arguments followed by `extra` CLI arguments.
    pub fn from_config(config: &ToolConfig, extra: &[String]) -> Self {
        let mut args = config.args.clone();
        args.extend(extra.iter().cloned());
        Self {
            command: config.command.clone(),
            args,
        }
    }

    pub fn display(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a tool run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub exit_code: i32,
    pub duration: Duration,
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run the tool in `cwd` and wait for it, killing it if `cancel` fires.
///
/// # Errors
///
/// Returns [`HotlintError::Config`] for an empty command,
/// [`HotlintError::ToolNotFound`] if the program is not installed,
/// [`HotlintError::Cancelled`] if it was killed, and [`HotlintError::Io`]
/// for other spawn failures.
pub fn run_tool(
    spec: &ToolSpec,
    cwd: &Path,
    cancel: &Cancellation,
) -> Result<ToolOutcome, HotlintError> {
    if spec.command.trim().is_empty() {
        return Err(HotlintError::Config("tool.command is empty".into()));
    }

    debug!(cwd = %cwd.display(), "running {}", spec.display());
    let started = Instant::now();

    let mut child = Command::new(&spec.command)
        .args(&spec.args)
        .current_dir(cwd)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HotlintError::ToolNotFound(spec.command.clone())
            } else {
                HotlintError::Io(e)
            }
        })?;

    let status = cancel.wait(&mut child, &spec.command)?;
    let exit_code = status.code().unwrap_or(SIGNALLED_EXIT_CODE);
    let duration = started.elapsed();
    debug!(exit_code, elapsed_ms = duration.as_millis() as u64, "{} finished", spec.command);

    Ok(ToolOutcome {
        exit_code,
        duration,
    })
}
