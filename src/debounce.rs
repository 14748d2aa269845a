//! Trailing-edge debounce
//!
//! The controller is either idle or holds one pending payload with a deadline.
//! Scheduling while pending replaces the payload and restarts the quiet period, so a burst
//! of edits closer together than the interval fires once, with the last payload.

use std::{future, time::Duration};

use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// Quiet interval used by the editor (500 ms)
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    payload: T,
}

#[derive(Debug)]
pub struct DebounceController<T> {
    quiet: Duration,
    pending: Option<Pending<T>>,
}

impl<T> Default for DebounceController<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_INTERVAL)
    }
}

impl<T> DebounceController<T> {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    #[must_use]
    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start or restart the quiet period with `payload`
    pub fn schedule(&mut self, payload: T) {
        if self.pending.is_some() {
            trace!("restarting quiet period");
        }
        self.pending = Some(Pending {
            deadline: Instant::now() + self.quiet,
            payload,
        });
    }

    /// Return to idle, handing back the payload that would have fired
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.payload)
    }

    /// Wait until the quiet period elapses and take the payload
    ///
    /// Never resolves while idle. Cancel-safe: dropping the future before it resolves
    /// leaves the pending payload in place, so it can sit in a `select!` loop.
    pub async fn fired(&mut self) -> T {
        let Some(deadline) = self.pending.as_ref().map(|p| p.deadline) else {
            return future::pending().await;
        };

        sleep_until(deadline).await;

        match self.pending.take() {
            Some(p) => p.payload,
            None => future::pending().await,
        }
    }
}
