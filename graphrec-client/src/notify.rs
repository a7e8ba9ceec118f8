//! User-facing failure notification
//!
//! Most gateway failures degrade silently to "no data". Failing to record a
//! like is the exception: the user is told directly. The front end decides
//! how (dialog, stderr, ...) by supplying a [`FailureNotifier`].

/// Message shown when a like could not be recorded
pub const LIKE_FAILED_MESSAGE: &str = "Failed to log interaction. Is backend running?";

/// Surfaces a failure to the end user
pub trait FailureNotifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that only logs; used when no front end is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl FailureNotifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
