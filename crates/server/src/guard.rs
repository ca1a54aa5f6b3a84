//! Model health guard.
//!
//! An artifact integrity fault means the loaded model is inconsistent with
//! the pipeline, and every later request would be answered from the same
//! broken state. The first such fault trips the guard: `/predict` stops
//! running the pipeline and `/health` reports degraded so the process gets
//! replaced. The flag is an [`AtomicBool`] so the per-request check is a
//! single relaxed load; the reason sits behind a `parking_lot::Mutex` since
//! it is only written once.

use std::sync::atomic::{AtomicBool, Ordering};

use scout_ml::PredictError;

/// Snapshot returned by [`ModelGuard::status`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct GuardStatus {
    pub healthy: bool,
    pub reason: Option<String>,
}

pub struct ModelGuard {
    healthy: AtomicBool,
    reason: parking_lot::Mutex<Option<String>>,
}

impl ModelGuard {
    pub fn new() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            reason: parking_lot::Mutex::new(None),
        }
    }

    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Mark the model unusable. Only the first reason is kept.
    pub fn trip(&self, reason: String) {
        let mut slot = self.reason.lock();
        if slot.is_none() {
            tracing::error!(reason = %reason, "model guard tripped, predictions disabled");
            *slot = Some(reason);
        }
        self.healthy.store(false, Ordering::SeqCst);
    }

    pub fn status(&self) -> GuardStatus {
        let healthy = self.is_healthy();
        GuardStatus {
            healthy,
            reason: self.reason.lock().clone(),
        }
    }

    /// Fail with the recorded integrity error once tripped.
    pub fn check(&self) -> Result<(), PredictError> {
        if self.is_healthy() {
            Ok(())
        } else {
            let reason = self
                .reason
                .lock()
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            Err(PredictError::ArtifactIntegrity(reason))
        }
    }
}

impl Default for ModelGuard {
    fn default() -> Self {
        Self::new()
    }
}
