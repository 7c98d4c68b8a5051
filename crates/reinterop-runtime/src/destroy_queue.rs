//! Deferred destruction
//!
//! Native objects owned by managed ones are not released from wherever the
//! owner happens to be collected. The release is queued as a function id plus
//! pointer and the whole batch is dispatched at one point of the host's
//! update. The batch is taken under the lock and dispatched after it is
//! dropped, so a release that enqueues another one cannot deadlock; such
//! entries wait for the next flush.

use parking_lot::Mutex;

/// One queued release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRelease {
    /// Position of the releasing export in the generated dispatch table
    pub function_id: i32,
    pub pointer: usize,
}

#[derive(Debug, Default)]
pub struct DestroyQueue {
    pending: Mutex<Vec<PendingRelease>>,
}

impl DestroyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callable from any thread
    pub fn enqueue(&self, function_id: i32, pointer: usize) {
        self.pending.lock().push(PendingRelease { function_id, pointer });
    }

    /// Dispatch every queued release in enqueue order; returns how many ran
    pub fn flush<F>(&self, mut dispatch: F) -> usize
    where
        F: FnMut(PendingRelease),
    {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() {
            return 0;
        }
        log::debug!("Flushing {} deferred releases", batch.len());
        let count = batch.len();
        for release in batch {
            dispatch(release);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
