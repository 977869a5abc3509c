//! Reconstructs where a frame was at some past instant.
//!
//! We walk the history from newest to oldest while climbing up the parent chain at the same time.
//! Every link is looked up as of the stamp of the link below it, since different links of a chain
//! are usually updated at different times.

use std::collections::VecDeque;
use std::ops::ControlFlow;

use ahash::HashSet;
use glam::DAffine3;

use super::TransformGraph;
use crate::{FrameTransform, Timestamp, TransformHistory, TransformUpdate, UpdateBatch};

/// Pose of `name` in the coordinates of its root at `time`, or `None` if `history` doesn't reach back far enough.
pub(super) fn root_from_frame_at(
    graph: &TransformGraph,
    name: &str,
    time: Timestamp,
    history: &dyn TransformHistory,
) -> Option<DAffine3> {
    re_tracing::profile_function!();

    let mut walk = Walk::new(name, time);

    walk.climb_time_invariant(graph);
    if !walk.is_done() {
        history.for_each_newest_first(&mut |batch| {
            while let Some(update) = walk.next_link(graph, batch) {
                if !walk.push(update.transform, &update.parent, update.stamp) {
                    return ControlFlow::Break(());
                }
                walk.climb_time_invariant(graph);
                if walk.is_done() {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
    }

    if !walk.reached_root || walk.chain.is_empty() {
        re_log::trace!(
            "Could not resolve `{name}` at {time}, got stuck at `{}`",
            walk.looking_for
        );
        return None;
    }

    Some(
        walk.chain
            .iter()
            .fold(DAffine3::IDENTITY, |root_from_parent, transform| {
                root_from_parent * transform.parent_from_child()
            }),
    )
}

struct Walk {
    /// Root-most link first.
    chain: VecDeque<FrameTransform>,

    looking_for: String,
    search_time: Timestamp,

    /// Guards against loops in history that the live graph would have rejected.
    visited: HashSet<String>,

    reached_root: bool,
    aborted: bool,
}

impl Walk {
    fn new(start: &str, time: Timestamp) -> Self {
        Self {
            chain: VecDeque::new(),
            looking_for: start.to_owned(),
            search_time: time,
            visited: HashSet::default(),
            reached_root: false,
            aborted: false,
        }
    }

    fn is_done(&self) -> bool {
        self.reached_root || self.aborted
    }

    /// The record in `batch` that continues the walk, if any.
    ///
    /// Records naming another parent than the live one were rejected by the graph and are skipped.
    fn next_link<'a>(
        &self,
        graph: &TransformGraph,
        batch: &'a UpdateBatch,
    ) -> Option<&'a TransformUpdate> {
        let live_parent = graph.parent_name(&self.looking_for);
        batch.latest_for_child_at(&self.looking_for, live_parent, self.search_time)
    }

    /// Returns `false` if the walk ran into a loop.
    fn push(&mut self, transform: FrameTransform, parent: &str, stamp: Timestamp) -> bool {
        if !self.visited.insert(std::mem::take(&mut self.looking_for)) {
            self.aborted = true;
            return false;
        }
        self.chain.push_front(transform);
        parent.clone_into(&mut self.looking_for);
        self.search_time = stamp;
        true
    }

    /// Static and not-yet-defined frames don't need history, so take them straight from the live graph.
    fn climb_time_invariant(&mut self, graph: &TransformGraph) {
        while let Some(frame) = graph.frame(&self.looking_for)
            && frame.is_time_invariant()
        {
            let parent = frame.parent.map(|id| graph.frames[id.index()].name.as_str());
            match parent {
                None => {
                    self.chain.push_front(frame.transform);
                    self.reached_root = true;
                    return;
                }
                Some(parent) => {
                    let search_time = self.search_time;
                    if !self.push(frame.transform, parent, search_time) {
                        return;
                    }
                }
            }
        }
    }
}
