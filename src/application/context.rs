use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::errors::DomainError;

/// Deadline and cancellation signal carried by a single service call.
///
/// Services check it before every storage round-trip and right before
/// commit; once it has fired no further work is committed.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    /// A context that never expires on its own.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancelled: Arc::default(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancelled: Arc::default(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with [`DomainError::Cancelled`] naming `stage` once the context
    /// is cancelled or past its deadline.
    pub fn check(&self, stage: &'static str) -> Result<(), DomainError> {
        if self.is_done() {
            return Err(DomainError::Cancelled { stage });
        }
        Ok(())
    }

    /// Returns a guard that cancels this context when dropped, unless it is
    /// disarmed first. Used to propagate an abandoned request (for example a
    /// client disconnect) into work already running on another thread.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop {
            cancelled: Arc::clone(&self.cancelled),
            armed: true,
        }
    }
}

#[derive(Debug)]
pub struct CancelOnDrop {
    cancelled: Arc<AtomicBool>,
    armed: bool,
}

impl CancelOnDrop {
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.cancelled.store(true, Ordering::Release);
        }
    }
}
