//! Cooperative cancellation for in-flight planning requests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::PlanError;

/// Shared cancellation flag.
///
/// Clones observe the same flag, so a caller can hand one clone to the
/// planner and cancel through another. The planner checks it at every
/// external call boundary.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns [`PlanError::Cancelled`] once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), PlanError> {
        if self.is_cancelled() {
            Err(PlanError::Cancelled)
        } else {
            Ok(())
        }
    }
}
