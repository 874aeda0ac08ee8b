use std::process::{Child, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::HotlintError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cancellation signal shared between a caller and the external calls it
/// starts.
///
/// Fires either when [`Cancellation::cancel`] is called on any clone or when
/// the optional deadline passes.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hotlint_core::Cancellation;
///
/// let token = Cancellation::with_timeout(Duration::from_secs(60));
/// assert!(!token.is_cancelled());
///
/// let other = token.clone();
/// other.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A token that only fires when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also fires once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Build from a seconds value where `0` means no deadline.
    pub fn from_secs(timeout_secs: u64) -> Self {
        if timeout_secs == 0 {
            Self::new()
        } else {
            Self::with_timeout(Duration::from_secs(timeout_secs))
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Human-readable reason, used in `Cancelled` errors.
    pub fn reason(&self) -> &'static str {
        if self.flag.load(Ordering::SeqCst) {
            "cancelled by caller"
        } else {
            "deadline exceeded"
        }
    }

    /// Wait for `child` to exit, killing it if this token fires first.
    ///
    /// # Errors
    ///
    /// Returns [`HotlintError::Cancelled`] when the child was killed, or
    /// [`HotlintError::Io`] if its status could not be polled.
    pub fn wait(&self, child: &mut Child, what: &str) -> Result<ExitStatus, HotlintError> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if self.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(HotlintError::Cancelled(format!("{what}: {}", self.reason())));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        assert!(!Cancellation::new().is_cancelled());
        assert!(!Cancellation::from_secs(0).is_cancelled());
    }

    #[test]
    fn zero_duration_deadline_fires_immediately() {
        let token = Cancellation::with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());
        assert_eq!(token.reason(), "deadline exceeded");
    }

    #[test]
    fn cancel_propagates_to_clones() {
        let token = Cancellation::from_secs(3600);
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(clone.reason(), "cancelled by caller");
    }

    #[cfg(unix)]
    #[test]
    fn wait_kills_child_past_deadline() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let token = Cancellation::with_timeout(Duration::from_millis(50));
        let started = Instant::now();
        let err = token.wait(&mut child, "sleep").unwrap_err();
        assert!(matches!(err, HotlintError::Cancelled(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn wait_returns_exit_status() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let status = Cancellation::new().wait(&mut child, "true").unwrap();
        assert!(status.success());
    }
}
