use glam::DAffine3;

use crate::{
    PoseError, TimeWindowedHistory, Timestamp, TransformGraph, TransformHistoryConfig,
    UpdateBatch,
};

/// Where a [`ResolvedPose`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseSource {
    /// Reconstructed for the requested time.
    History,

    /// History didn't reach back far enough, this is the latest known pose instead.
    Latest,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedPose {
    /// Transforms from the `from` frame into the `to` frame.
    pub to_from_from: DAffine3,
    pub source: PoseSource,
}

/// Keeps a [`TransformGraph`] and the [`TimeWindowedHistory`] feeding its time-travel queries in sync.
///
/// Feed every decoded batch through [`Self::apply`].
#[derive(Clone, Debug, Default)]
pub struct TransformTracker {
    graph: TransformGraph,
    history: TimeWindowedHistory,
}

impl TransformTracker {
    pub fn new(config: TransformHistoryConfig) -> Self {
        Self {
            graph: TransformGraph::new(),
            history: TimeWindowedHistory::new(config),
        }
    }

    #[inline]
    pub fn graph(&self) -> &TransformGraph {
        &self.graph
    }

    #[inline]
    pub fn history(&self) -> &TimeWindowedHistory {
        &self.history
    }

    pub fn apply(&mut self, batch: UpdateBatch) {
        re_tracing::profile_function!();

        self.graph.apply_batch(&batch);
        self.history.insert(batch);
    }

    #[inline]
    pub fn pose_in_root(&mut self, name: &str) -> Result<DAffine3, PoseError> {
        self.graph.pose_in_root(name)
    }

    #[inline]
    pub fn relative_pose(&mut self, from: &str, to: &str) -> Result<DAffine3, PoseError> {
        self.graph.relative_pose(from, to)
    }

    #[inline]
    pub fn relative_pose_at(
        &self,
        from: &str,
        to: &str,
        time: Timestamp,
    ) -> Result<DAffine3, PoseError> {
        self.graph.relative_pose_at(from, to, time, &self.history)
    }

    /// Like [`Self::relative_pose_at`], but falls back to the latest pose if history can't resolve `time`.
    ///
    /// Unknown frames are still an error.
    pub fn relative_pose_or_latest(
        &mut self,
        from: &str,
        to: &str,
        time: Timestamp,
    ) -> Result<ResolvedPose, PoseError> {
        match self.relative_pose_at(from, to, time) {
            Ok(to_from_from) => Ok(ResolvedPose {
                to_from_from,
                source: PoseSource::History,
            }),

            Err(err @ PoseError::UnresolvedHistory { .. }) => {
                re_log::debug_once!("{err}, falling back to the latest pose");
                Ok(ResolvedPose {
                    to_from_from: self.relative_pose(from, to)?,
                    source: PoseSource::Latest,
                })
            }

            Err(err @ PoseError::UnknownFrame { .. }) => Err(err),
        }
    }

    /// Rebuilds the graph as it was at `time`, from static frames plus the retained history.
    ///
    /// This is how to go backwards, since [`TransformGraph::apply`] only moves forward.
    pub fn seek(&mut self, time: Timestamp) {
        re_tracing::profile_function!();

        self.graph.reset(true);
        for batch in self
            .history
            .iter_oldest_first()
            .take_while(|batch| batch.stamp <= time)
        {
            self.graph.apply_batch(batch);
        }
    }

    /// Forgets everything, including static frames.
    pub fn reset(&mut self) {
        self.graph.reset(false);
        self.history.clear();
    }
}
