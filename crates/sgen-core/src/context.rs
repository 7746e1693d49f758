//! Run Context: per-run identity and cancellation
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run-scoped cancellation signal. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub cancellation: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// `Err(Cancelled)` once the token has fired. Stages call this between
    /// items.
    pub fn check(&self) -> Result<(), crate::error::SgenError> {
        if self.is_cancelled() {
            Err(crate::error::SgenError::Cancelled(self.run_id.clone()))
        } else {
            Ok(())
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
