use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CoverError, Result};

/// Drapeau d'annulation partagé, consulté entre deux lots.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(CoverError::Cancelled)
        } else {
            Ok(())
        }
    }
}
