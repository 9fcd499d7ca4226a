use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Progress of one scan, counted in files.
///
/// Progress is reported once per finished (or failed) file, so the fraction
/// moves in steps of `1 / files_total`. Counting lines instead would need a
/// second full read of every file to learn the total up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub files_done: usize,
    pub files_total: usize,
}

impl ProgressEvent {
    /// Fraction complete in `[0, 1]`; an empty scan counts as complete
    pub fn fraction(&self) -> f64 {
        if self.files_total == 0 {
            1.0
        } else {
            (self.files_done.min(self.files_total) as f64) / self.files_total as f64
        }
    }

    /// Whole percent, rounded down
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).floor() as u8
    }
}

/// Lock-free progress counter shared between the scanning thread (single
/// writer) and any number of readers such as a UI refresh loop.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    files_done: Arc<AtomicUsize>,
    files_total: Arc<AtomicUsize>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an event; counts never move backwards
    pub fn record(&self, event: ProgressEvent) {
        self.files_total.store(event.files_total, Ordering::Release);
        self.files_done.fetch_max(event.files_done, Ordering::AcqRel);
    }

    pub fn reset(&self) {
        self.files_done.store(0, Ordering::Release);
        self.files_total.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> ProgressEvent {
        ProgressEvent {
            files_done: self.files_done.load(Ordering::Acquire),
            files_total: self.files_total.load(Ordering::Acquire),
        }
    }
}
