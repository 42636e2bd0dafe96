/// Staged application of accepted suggestions.
///
/// Blocks are released one interval apart; each release is one
/// `add_time_block` call. Cancelling the token stops every later release.
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::store::Store;
use crate::types::{BlockId, NewTimeBlock};

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct StagedApply {
    queue: VecDeque<NewTimeBlock>,
    interval: Duration,
    next_due: Instant,
    token: CancelToken,
    applied: Vec<BlockId>,
}

impl StagedApply {
    /// The first block becomes due one `interval` after `start`.
    pub fn new(
        blocks: Vec<NewTimeBlock>,
        start: Instant,
        interval: Duration,
        token: CancelToken,
    ) -> Self {
        Self {
            queue: blocks.into(),
            interval,
            next_due: start + interval,
            token,
            applied: Vec::new(),
        }
    }

    /// Adds every block due at `now` to `store`; returns how many were added.
    pub fn apply_due(&mut self, store: &mut Store, now: Instant) -> usize {
        let mut added = 0;
        while !self.is_finished() && now >= self.next_due {
            let Some(block) = self.queue.pop_front() else {
                break;
            };
            let id = store.add_time_block(block);
            self.applied.push(id);
            self.next_due += self.interval;
            added += 1;
        }
        if self.token.is_cancelled() && !self.queue.is_empty() {
            debug!(skipped = self.queue.len(), "staged apply cancelled");
            self.queue.clear();
        }
        added
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() || self.token.is_cancelled()
    }

    pub fn remaining(&self) -> usize {
        if self.token.is_cancelled() {
            0
        } else {
            self.queue.len()
        }
    }

    /// Ids created by this run, in creation order.
    pub fn applied(&self) -> &[BlockId] {
        &self.applied
    }
}
