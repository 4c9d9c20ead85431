//! Live resource accounting
//!
//! Depth targets register themselves with a [`ResourceTracker`] while they are
//! allocated, which makes leaked or doubled allocations observable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts live tracked allocations.
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    live: Arc<AtomicUsize>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one allocation; it is released when the returned token drops.
    pub fn track(&self) -> TrackedResource {
        self.live.fetch_add(1, Ordering::Relaxed);
        TrackedResource {
            live: Arc::clone(&self.live),
        }
    }

    /// Number of allocations currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

/// Token held by a tracked allocation.
#[derive(Debug)]
pub struct TrackedResource {
    live: Arc<AtomicUsize>,
}

impl Drop for TrackedResource {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_release_on_drop() {
        let tracker = ResourceTracker::new();
        let a = tracker.track();
        let b = tracker.clone().track();
        assert_eq!(tracker.live(), 2);
        drop(a);
        assert_eq!(tracker.live(), 1);
        drop(b);
        assert_eq!(tracker.live(), 0);
    }
}
