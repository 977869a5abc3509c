use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::{Timestamp, TransformHistoryConfig, UpdateBatch};

/// Read access to previously applied update batches, as needed by time-travel queries.
///
/// Implementations must visit batches from newest to oldest
/// and stop as soon as the visitor returns [`ControlFlow::Break`].
pub trait TransformHistory {
    fn for_each_newest_first(&self, visit: &mut dyn FnMut(&UpdateBatch) -> ControlFlow<()>);
}

/// Batches sorted oldest first, e.g. a synthetic fixture.
impl TransformHistory for Vec<UpdateBatch> {
    fn for_each_newest_first(&self, visit: &mut dyn FnMut(&UpdateBatch) -> ControlFlow<()>) {
        for batch in self.iter().rev() {
            if visit(batch).is_break() {
                break;
            }
        }
    }
}

/// A bounded, time-sorted buffer of the most recent update batches.
///
/// Everything older than [`TransformHistoryConfig::buffer_window`] relative
/// to the newest retained batch gets evicted on insert.
#[derive(Clone, Debug, Default)]
pub struct TimeWindowedHistory {
    config: TransformHistoryConfig,

    /// Sorted by [`UpdateBatch::stamp`], oldest first.
    batches: VecDeque<UpdateBatch>,
}

impl TimeWindowedHistory {
    pub fn new(config: TransformHistoryConfig) -> Self {
        Self {
            config,
            batches: VecDeque::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &TransformHistoryConfig {
        &self.config
    }

    #[inline]
    pub fn buffer_window(&self) -> Duration {
        self.config.buffer_window
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    #[inline]
    pub fn oldest_stamp(&self) -> Option<Timestamp> {
        self.batches.front().map(|batch| batch.stamp)
    }

    #[inline]
    pub fn newest_stamp(&self) -> Option<Timestamp> {
        self.batches.back().map(|batch| batch.stamp)
    }

    /// Retained batches, oldest first.
    #[inline]
    pub fn iter_oldest_first(&self) -> impl DoubleEndedIterator<Item = &UpdateBatch> + '_ {
        self.batches.iter()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }

    /// Inserts a batch at its time-sorted position, then evicts whatever fell out of the window.
    ///
    /// Batches usually arrive roughly in order, so we scan backwards from the newest entry.
    /// Batches with equal stamps keep their arrival order.
    pub fn insert(&mut self, batch: UpdateBatch) {
        re_tracing::profile_function!();

        let index = self
            .batches
            .iter()
            .rposition(|existing| existing.stamp <= batch.stamp)
            .map_or(0, |position| position + 1);

        if index < self.batches.len() {
            re_log::trace!(
                "Out-of-order batch at {} inserted {} entries from the end",
                batch.stamp,
                self.batches.len() - index
            );
        }

        self.batches.insert(index, batch);
        self.evict();
    }

    fn evict(&mut self) {
        let Some(newest) = self.newest_stamp() else {
            return;
        };
        let window = self.config.buffer_window_nanos();

        while let Some(oldest) = self.batches.front()
            && newest.nanos_since(oldest.stamp) > window
        {
            self.batches.pop_front();
        }
    }
}

impl TransformHistory for TimeWindowedHistory {
    fn for_each_newest_first(&self, visit: &mut dyn FnMut(&UpdateBatch) -> ControlFlow<()>) {
        for batch in self.batches.iter().rev() {
            if visit(batch).is_break() {
                break;
            }
        }
    }
}
