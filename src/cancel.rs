use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ExtractError;

/// Cooperative stop flag shared between the controller and the worker.
///
/// The flag only ever goes from "running" to "cancelled"; workers poll it at
/// document, page and record boundaries and never block on it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<(), ExtractError> {
        if self.is_cancelled() {
            Err(ExtractError::Cancelled)
        } else {
            Ok(())
        }
    }
}
