use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Busy indicator for one kind of operation.
///
/// Counts outstanding calls, so overlapping calls keep the flag raised until
/// the last one finishes.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    outstanding: Arc<AtomicUsize>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding.load(Ordering::Acquire) > 0
    }

    /// Raises the flag until the returned guard is dropped.
    #[must_use = "the flag drops back as soon as the guard is dropped"]
    pub fn enter(&self) -> BusyGuard {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        BusyGuard {
            outstanding: Arc::clone(&self.outstanding),
        }
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    outstanding: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}
