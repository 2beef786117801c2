//! Bounded thumbnail batch queue.
//!
//! The queue owns the pending work list and the in-flight batch counter; it
//! never performs I/O itself. The coordinator asks it to `drain`, hands the
//! returned batches to the store service, and calls `settle` once per
//! completed batch — which drains again, so the queue is self-driving and
//! needs no external polling.

use crate::item::ItemId;
use arrayvec::ArrayVec;
use std::path::PathBuf;

/// Hard cap on work items per batch; `batch_len` is clamped to this.
pub const MAX_BATCH_LEN: usize = 8;
pub const DEFAULT_MAX_BATCHES: usize = 2;
pub const DEFAULT_BATCH_LEN: usize = 3;

/// One placeholder awaiting a rendered thumbnail. Consumed exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct ThumbWork {
    pub id: ItemId,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
    pub last_modified: i64,
}

pub type ThumbBatch = ArrayVec<ThumbWork, MAX_BATCH_LEN>;

pub struct ThumbnailQueue {
    pending: Vec<ThumbWork>,
    in_flight: usize,
    max_batches: usize,
    batch_len: usize,
}

impl ThumbnailQueue {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_BATCHES, DEFAULT_BATCH_LEN)
    }

    pub fn with_limits(max_batches: usize, batch_len: usize) -> Self {
        Self {
            pending: Vec::new(),
            in_flight: 0,
            max_batches: max_batches.max(1),
            batch_len: batch_len.clamp(1, MAX_BATCH_LEN),
        }
    }

    /// Replace the pending queue wholesale. Batches already in flight are
    /// unaffected; their completions refer to ids that may no longer exist,
    /// which the coordinator treats as a no-op.
    pub fn enqueue_all(&mut self, items: Vec<ThumbWork>) {
        self.pending = items;
    }

    /// Pop batches until the in-flight bound is reached or the pending list
    /// is empty. Work is popped LIFO, so callers enqueue in reverse display
    /// order to dispatch the top of the view first. The counter is
    /// incremented before a batch is handed out.
    pub fn drain(&mut self) -> Vec<ThumbBatch> {
        let mut batches = Vec::new();
        while self.in_flight < self.max_batches && !self.pending.is_empty() {
            let mut batch = ThumbBatch::new();
            while batch.len() < self.batch_len {
                match self.pending.pop() {
                    Some(work) => batch.push(work),
                    None => break,
                }
            }
            self.in_flight += 1;
            batches.push(batch);
        }
        batches
    }

    /// One batch settled (success or failure alike); free its slot and keep
    /// draining. This is the sole re-entry point.
    pub fn settle(&mut self) -> Vec<ThumbBatch> {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.drain()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
