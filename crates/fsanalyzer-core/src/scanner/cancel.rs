/// Cooperative cancellation for long walks.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Entries between two polls of the cancel token in a visit loop.
pub(crate) const CANCEL_CHECK_INTERVAL: u64 = 256;

/// Cloneable flag polled by the lister's and the aggregator's visit loops.
///
/// All clones share one flag; once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every walk holding this token to stop as soon as possible.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
