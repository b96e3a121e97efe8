//! Cooperative cancellation for long-running operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often a sleeping waiter rechecks the flag.
const WAIT_SLICE: Duration = Duration::from_millis(250);

/// A cheap, clonable cancellation flag.
///
/// The CLI arms one token from its Ctrl-C handler; the acquisition loop
/// checks it between steps and while waiting out retry intervals.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on cancellation.
    ///
    /// Returns `true` when the full duration elapsed and `false` when the
    /// wait was cut short. The sleep is sliced so cancellation is observed
    /// within [`WAIT_SLICE`] no matter how long the wait is.
    pub async fn wait(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_cancelled() {
                return false;
            }
            let slice = remaining.min(WAIT_SLICE);
            tokio::time::sleep(slice).await;
            remaining = remaining.saturating_sub(slice);
        }
        !self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_returns_false_when_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        assert!(!token.wait(Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_wait_elapses_when_uncancelled() {
        let token = CancelToken::new();
        assert!(token.wait(Duration::from_millis(10)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_observes_cancel_midway() {
        let token = CancelToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            canceller.cancel();
        });

        assert!(!token.wait(Duration::from_secs(3600)).await);
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
