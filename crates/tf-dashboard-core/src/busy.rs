use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::DashboardError;

/// Per-form in-flight flag. A second submit while one is pending is refused,
/// never queued.
#[derive(Debug, Clone)]
pub struct FormGuard {
    form: &'static str,
    busy: Arc<AtomicBool>,
}

impl FormGuard {
    pub fn new(form: &'static str) -> Self {
        Self {
            form,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn try_begin(&self) -> Result<BusyToken, DashboardError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DashboardError::Busy(self.form))?;
        Ok(BusyToken {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Clears the flag when dropped.
#[derive(Debug)]
pub struct BusyToken {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
