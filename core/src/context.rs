//! Cancellation and deadline handle carried by each request.
//!
//! This layer only attaches the context; the transport decides how to honor
//! it (socket timeouts, polling `is_done`, ...).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Clones share the same cancel flag.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// Never cancelled, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancelled, or past the deadline.
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_unbounded() {
        let ctx = Context::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_done());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::with_timeout(Duration::from_secs(60));
        let other = ctx.clone();
        other.cancel();
        assert!(ctx.is_cancelled());
        assert!(ctx.is_done());
    }

    #[test]
    fn past_deadline_is_done() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(ctx.is_done());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }
}
