//! Fire-and-forget user notifications.

use std::time::Duration;
use tracing::warn;

/// Shows a short, dismissible message to the user.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Displays `message` with a dismiss action labelled `action` for `duration`.
    fn display(&self, message: &str, action: &str, duration: Duration);
}

/// Notifier that writes messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn display(&self, message: &str, action: &str, duration: Duration) {
        warn!(action, duration_ms = whole_millis(duration), "{}", message);
    }
}

/// Milliseconds in `duration`, saturating at `u64::MAX`.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
