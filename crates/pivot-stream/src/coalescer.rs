//! Burst coalescing for tree updates.
//!
//! The generator reports one message per node it produces, often many within
//! a few milliseconds. Running a layout and reconcile pass for each one would
//! waste work that the next message immediately invalidates.
//!
//! [`UpdateCoalescer`] queues updates in arrival order and releases them as a
//! single batch once a fixed window has elapsed since the first queued update,
//! or immediately on [`UpdateCoalescer::drain`]. Applying the batch in order is
//! equivalent to applying each update as it arrived, because every update is a
//! pure merge composed left to right.
//!
//! Time is passed in by the caller, which keeps the coalescer deterministic
//! under test.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use pivot_stream::coalescer::UpdateCoalescer;
//! use web_time::Instant;
//!
//! let start = Instant::now();
//! let mut coalescer = UpdateCoalescer::new(Duration::from_millis(100));
//!
//! coalescer.push("a", start);
//! coalescer.push("b", start + Duration::from_millis(30));
//! assert!(coalescer.take_due(start + Duration::from_millis(60)).is_none());
//!
//! let batch = coalescer.take_due(start + Duration::from_millis(100)).unwrap();
//! assert_eq!(batch, vec!["a", "b"]);
//! assert!(!coalescer.has_pending());
//! ```

use std::time::Duration;

use web_time::Instant;

/// Default batching window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100);

/// Queues items and releases them in batches bounded by a fixed window.
///
/// Not thread-safe; owned by a single session.
#[derive(Debug, Clone)]
pub struct UpdateCoalescer<T> {
    window: Duration,
    pending: Vec<T>,
    /// Arrival time of the oldest pending item.
    opened_at: Option<Instant>,
}

impl<T> Default for UpdateCoalescer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl<T> UpdateCoalescer<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
            opened_at: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Queue an item that arrived at `now`.
    ///
    /// The first item of a batch opens the window; later items join it
    /// without extending it.
    pub fn push(&mut self, item: T, now: Instant) {
        if self.pending.is_empty() {
            self.opened_at = Some(now);
        }
        self.pending.push(item);
    }

    /// Instant at which the pending batch becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.opened_at.map(|opened| opened + self.window)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Release the pending batch if its window has elapsed.
    #[must_use]
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<T>> {
        if self.is_due(now) {
            Some(self.drain())
        } else {
            None
        }
    }

    /// Release the pending batch regardless of the window.
    #[must_use]
    pub fn drain(&mut self) -> Vec<T> {
        self.opened_at = None;
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Discard pending items without releasing them.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.opened_at = None;
    }
}
