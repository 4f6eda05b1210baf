//! Cooperative cancellation token
//!
//! Every pipeline stage checks the token once per outer loop iteration and
//! bails out with [`PipelineError::Cancelled`], dropping any partial output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::errors::PipelineError;

/// Shared cancellation flag handed to every stage of a run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Stages observe the flag at their next
    /// checkpoint.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Stage checkpoint: returns `Err(Cancelled)` once [`cancel`] has been
    /// called.
    ///
    /// [`cancel`]: CancelToken::cancel
    pub fn checkpoint(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
