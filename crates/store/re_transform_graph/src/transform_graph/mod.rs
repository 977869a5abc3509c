mod frame;
mod time_travel;

use ahash::HashMap;
use glam::DAffine3;
use nohash_hasher::IntMap;

use crate::{Timestamp, TransformHistory, TransformUpdate, UpdateBatch};

use self::frame::FrameId;
pub use self::frame::{Frame, FrameState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoseError {
    #[error("unknown frame `{frame}`")]
    UnknownFrame { frame: String },

    #[error("could not resolve frame `{frame}` back to its root at {time} from the retained history")]
    UnresolvedHistory { frame: String, time: Timestamp },
}

/// What [`TransformGraph::apply`] did with an update.
///
/// None of these are errors: out-of-order and conflicting updates are normal when several feeds get merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The child's transform was replaced.
    Applied,

    /// The update was not newer than what the child already has, and got discarded.
    Stale,

    /// The child already hangs off a different parent. Parent links are write-once, so the update got discarded.
    ParentConflict,

    /// Attaching the child would make it its own ancestor. The update got discarded.
    WouldCreateCycle,
}

impl ApplyOutcome {
    #[inline]
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// A forest of named coordinate frames, fed by parent→child transform updates.
///
/// Frames are created on first mention. A frame that has only been mentioned as a parent
/// is [`FrameState::AwaitingDefinition`] and acts as an identity-transformed root.
///
/// Current poses are served from cached world matrices that get recomputed lazily.
/// Past poses are reconstructed from an injected [`TransformHistory`], see [`Self::relative_pose_at`].
#[derive(Clone, Debug, Default)]
pub struct TransformGraph {
    /// Arena of all frames, indexed by [`FrameId`].
    frames: Vec<Frame>,

    frame_ids: HashMap<String, FrameId>,

    children: IntMap<FrameId, Vec<FrameId>>,

    /// If set, the `world_from_frame` of every frame is out of date.
    world_transforms_dirty: bool,
}

impl TransformGraph {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames, including the ones awaiting definition.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.frame_ids.contains_key(name)
    }

    #[inline]
    pub fn frame(&self, name: &str) -> Option<&Frame> {
        self.frame_ids.get(name).map(|id| &self.frames[id.index()])
    }

    /// All frame names, in order of first mention.
    pub fn frame_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.frames.iter().map(|frame| frame.name.as_str())
    }

    /// Returns `None` for roots and unknown frames.
    pub fn parent_name(&self, name: &str) -> Option<&str> {
        let frame = self.frame(name)?;
        frame
            .parent
            .map(|parent| self.frames[parent.index()].name.as_str())
    }

    /// Direct children of the given frame, empty for unknown frames.
    pub fn children_names(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        self.frame_ids
            .get(name)
            .and_then(|id| self.children.get(id))
            .into_iter()
            .flatten()
            .map(|child| self.frames[child.index()].name.as_str())
    }

    /// Applies a single transform update.
    ///
    /// Never fails. See [`ApplyOutcome`] for the ways an update can be discarded.
    pub fn apply(&mut self, update: &TransformUpdate) -> ApplyOutcome {
        if let Some(existing_parent) = self.parent_name(&update.child)
            && existing_parent != update.parent
        {
            re_log::warn_once!(
                "Frame `{}` is already a child of `{existing_parent}`, ignoring updates relative to `{}`",
                update.child,
                update.parent,
            );
            return ApplyOutcome::ParentConflict;
        }

        if self.would_create_cycle(&update.parent, &update.child) {
            re_log::warn_once!(
                "Attaching frame `{}` to `{}` would form a cycle, ignoring",
                update.child,
                update.parent,
            );
            return ApplyOutcome::WouldCreateCycle;
        }

        let parent = self.get_or_insert_frame(&update.parent, false);
        let child = self.get_or_insert_frame(&update.child, update.is_static);

        if self.frames[child.index()].parent.is_none() {
            let frame = &mut self.frames[child.index()];
            frame.parent = Some(parent);
            frame.state = FrameState::Defined;
            self.children.entry(parent).or_default().push(child);
            self.world_transforms_dirty = true;
        }

        let frame = &mut self.frames[child.index()];
        if update.stamp <= frame.last_update {
            re_log::trace!(
                "Discarding stale update for `{}` at {} (have {})",
                update.child,
                update.stamp,
                frame.last_update,
            );
            return ApplyOutcome::Stale;
        }

        frame.transform = update.transform;
        frame.last_update = update.stamp;
        frame.is_static = update.is_static;
        self.world_transforms_dirty = true;

        ApplyOutcome::Applied
    }

    /// Applies all updates of a batch, in order.
    pub fn apply_batch(&mut self, batch: &UpdateBatch) {
        re_tracing::profile_function!();

        for update in &batch.updates {
            self.apply(update);
        }
    }

    /// Drops frames so that history can be replayed from scratch, e.g. after seeking backwards.
    ///
    /// With `keep_static`, static frames survive together with their parent links.
    /// A parent that didn't survive on its own comes back as a frame awaiting definition.
    pub fn reset(&mut self, keep_static: bool) {
        re_tracing::profile_function!();

        let previous = std::mem::take(self);
        if !keep_static {
            return;
        }

        let kept: Vec<&Frame> = previous
            .frames
            .iter()
            .filter(|frame| frame.is_static && frame.state == FrameState::Defined)
            .collect();

        for frame in &kept {
            let id = self.get_or_insert_frame(&frame.name, true);
            let new_frame = &mut self.frames[id.index()];
            new_frame.state = frame.state;
            new_frame.transform = frame.transform;
            new_frame.last_update = frame.last_update;
        }

        for frame in &kept {
            if let Some(parent) = frame.parent {
                let parent = self.get_or_insert_frame(&previous.frames[parent.index()].name, false);
                let child = self.frame_ids[&frame.name];
                self.frames[child.index()].parent = Some(parent);
                self.children.entry(parent).or_default().push(child);
            }
        }

        self.world_transforms_dirty = !self.frames.is_empty();

        re_log::debug!(
            "Reset transform graph, kept {} static frames out of {}",
            kept.len(),
            previous.frames.len()
        );
    }

    /// Pose of the frame in the coordinates of its root, as of the latest applied updates.
    pub fn pose_in_root(&mut self, name: &str) -> Result<DAffine3, PoseError> {
        self.update_world_transforms();
        let id = self.frame_id(name)?;
        Ok(self.frames[id.index()].world_from_frame)
    }

    /// Transform from `from` into `to` coordinates, as of the latest applied updates.
    ///
    /// Both frames are assumed to share a root.
    pub fn relative_pose(&mut self, from: &str, to: &str) -> Result<DAffine3, PoseError> {
        self.update_world_transforms();
        let world_from_from = self.frames[self.frame_id(from)?.index()].world_from_frame;
        let world_from_to = self.frames[self.frame_id(to)?.index()].world_from_frame;
        Ok(world_from_to.inverse() * world_from_from)
    }

    /// Transform from `from` into `to` coordinates at `time`, reconstructed from `history`.
    ///
    /// Fails with [`PoseError::UnresolvedHistory`] if `history` doesn't reach back far enough
    /// to resolve either frame. Whether to fall back to [`Self::relative_pose`] then is up to the caller.
    pub fn relative_pose_at(
        &self,
        from: &str,
        to: &str,
        time: Timestamp,
        history: &dyn TransformHistory,
    ) -> Result<DAffine3, PoseError> {
        re_tracing::profile_function!();

        self.frame_id(from)?;
        self.frame_id(to)?;

        let world_from_from = self.root_from_frame_at(from, time, history)?;
        let world_from_to = self.root_from_frame_at(to, time, history)?;
        Ok(world_from_to.inverse() * world_from_from)
    }

    fn root_from_frame_at(
        &self,
        name: &str,
        time: Timestamp,
        history: &dyn TransformHistory,
    ) -> Result<DAffine3, PoseError> {
        time_travel::root_from_frame_at(self, name, time, history).ok_or_else(|| {
            PoseError::UnresolvedHistory {
                frame: name.to_owned(),
                time,
            }
        })
    }

    fn frame_id(&self, name: &str) -> Result<FrameId, PoseError> {
        self.frame_ids
            .get(name)
            .copied()
            .ok_or_else(|| PoseError::UnknownFrame {
                frame: name.to_owned(),
            })
    }

    fn get_or_insert_frame(&mut self, name: &str, is_static: bool) -> FrameId {
        if let Some(id) = self.frame_ids.get(name) {
            return *id;
        }

        let id = FrameId::from_index(self.frames.len());
        self.frames
            .push(Frame::new_awaiting_definition(name.to_owned(), is_static));
        self.frame_ids.insert(name.to_owned(), id);
        self.world_transforms_dirty = true;
        id
    }

    /// Checked before any frame gets created, so rejected updates leave no trace.
    fn would_create_cycle(&self, parent: &str, child: &str) -> bool {
        if parent == child {
            return true;
        }
        let (Some(&child), Some(&parent)) = (self.frame_ids.get(child), self.frame_ids.get(parent))
        else {
            return false;
        };
        self.frames[child.index()].parent.is_none() && self.is_ancestor(child, parent)
    }

    /// Is `ancestor` somewhere up the parent chain of `frame`?
    fn is_ancestor(&self, ancestor: FrameId, frame: FrameId) -> bool {
        let mut current = self.frames[frame.index()].parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.frames[id.index()].parent;
        }
        false
    }

    /// Recomputes all world matrices in one pass from the roots down, if anything changed.
    fn update_world_transforms(&mut self) {
        if !self.world_transforms_dirty {
            return;
        }
        re_tracing::profile_function!();

        let mut pending: Vec<(FrameId, DAffine3)> = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.parent.is_none())
            .map(|(index, _)| (FrameId::from_index(index), DAffine3::IDENTITY))
            .collect();

        while let Some((id, world_from_parent)) = pending.pop() {
            let frame = &mut self.frames[id.index()];
            frame.world_from_frame = world_from_parent * frame.transform.parent_from_child();

            let world_from_frame = frame.world_from_frame;
            if let Some(children) = self.children.get(&id) {
                pending.extend(children.iter().map(|child| (*child, world_from_frame)));
            }
        }

        self.world_transforms_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use glam::{DQuat, DVec3};

    use super::*;
    use crate::FrameTransform;

    fn translation(parent: &str, child: &str, xyz: [f64; 3], sec: i64) -> TransformUpdate {
        TransformUpdate::new(
            parent,
            child,
            FrameTransform::from_translation(xyz),
            Timestamp::from_secs(sec),
        )
    }

    #[test]
    fn test_implicit_frames_await_definition() {
        let mut graph = TransformGraph::new();
        assert!(graph.apply(&translation("world", "base", [1.0, 0.0, 0.0], 0)).is_applied());

        let world = graph.frame("world").unwrap();
        assert_eq!(world.state(), FrameState::AwaitingDefinition);
        assert_eq!(world.last_update(), Timestamp::NEVER);
        assert_eq!(graph.parent_name("world"), None);

        let base = graph.frame("base").unwrap();
        assert_eq!(base.state(), FrameState::Defined);
        assert_eq!(graph.parent_name("base"), Some("world"));
        similar_asserts::assert_eq!(graph.children_names("world").collect::<Vec<_>>(), vec!["base"]);
    }

    #[test]
    fn test_frame_referenced_as_parent_first_gets_defined_later() {
        let mut graph = TransformGraph::new();
        graph.apply(&translation("base", "arm", [0.0, 1.0, 0.0], 0));
        assert!(graph.frame("base").unwrap().is_awaiting_definition());
        assert_eq!(
            graph.pose_in_root("arm").unwrap().translation,
            DVec3::new(0.0, 1.0, 0.0)
        );

        graph.apply(&translation("world", "base", [1.0, 0.0, 0.0], 0));
        assert_eq!(graph.frame("base").unwrap().state(), FrameState::Defined);
        assert_eq!(
            graph.pose_in_root("arm").unwrap().translation,
            DVec3::new(1.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_stale_updates_are_discarded() {
        let mut graph = TransformGraph::new();
        let update = translation("world", "base", [1.0, 0.0, 0.0], 5);
        assert_eq!(graph.apply(&update), ApplyOutcome::Applied);
        assert_eq!(graph.apply(&update), ApplyOutcome::Stale);
        assert_eq!(
            graph.apply(&translation("world", "base", [9.0, 0.0, 0.0], 4)),
            ApplyOutcome::Stale
        );

        let base = graph.frame("base").unwrap();
        assert_eq!(base.transform(), FrameTransform::from_translation([1.0, 0.0, 0.0]));
        assert_eq!(base.last_update(), Timestamp::from_secs(5));
    }

    #[test]
    fn test_last_update_never_decreases() {
        let mut graph = TransformGraph::new();
        let mut newest = Timestamp::NEVER;
        for sec in [3, 1, 7, 7, 2, 9, 8] {
            graph.apply(&translation("world", "base", [sec as f64, 0.0, 0.0], sec));
            let last_update = graph.frame("base").unwrap().last_update();
            assert!(last_update >= newest);
            newest = last_update;
        }
        assert_eq!(newest, Timestamp::from_secs(9));
    }

    #[test]
    fn test_parent_is_write_once() {
        let mut graph = TransformGraph::new();
        graph.apply(&translation("world", "base", [1.0, 0.0, 0.0], 0));

        let outcome = graph.apply(&translation("odom", "base", [5.0, 0.0, 0.0], 1));
        assert_eq!(outcome, ApplyOutcome::ParentConflict);
        assert_eq!(graph.parent_name("base"), Some("world"));
        assert_eq!(
            graph.frame("base").unwrap().transform(),
            FrameTransform::from_translation([1.0, 0.0, 0.0])
        );
        assert!(!graph.contains("odom"));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut graph = TransformGraph::new();
        graph.apply(&translation("a", "b", [1.0, 0.0, 0.0], 0));
        graph.apply(&translation("b", "c", [1.0, 0.0, 0.0], 0));

        assert_eq!(
            graph.apply(&translation("c", "a", [1.0, 0.0, 0.0], 0)),
            ApplyOutcome::WouldCreateCycle
        );
        assert_eq!(
            graph.apply(&translation("d", "d", [1.0, 0.0, 0.0], 0)),
            ApplyOutcome::WouldCreateCycle
        );
        assert_eq!(
            graph.apply(&translation("c", "x", [1.0, 0.0, 0.0], 0)),
            ApplyOutcome::Applied
        );
        assert_eq!(graph.parent_name("a"), None);
        assert!(!graph.contains("d"));
        assert_eq!(graph.len(), 4);
        assert_eq!(
            graph.pose_in_root("c").unwrap().translation,
            DVec3::new(2.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_pose_in_root_composes_rotations() {
        let mut graph = TransformGraph::new();
        graph.apply(&TransformUpdate::new(
            "world",
            "base",
            FrameTransform::new([1.0, 0.0, 0.0], DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2)),
            Timestamp::ZERO,
        ));
        graph.apply(&translation("base", "arm", [1.0, 0.0, 0.0], 0));

        let world_from_arm = graph.pose_in_root("arm").unwrap();
        assert!(
            world_from_arm
                .translation
                .abs_diff_eq(DVec3::new(1.0, 1.0, 0.0), 1e-12)
        );
    }

    #[test]
    fn test_unknown_frames() {
        let mut graph = TransformGraph::new();
        graph.apply(&translation("world", "base", [1.0, 0.0, 0.0], 0));
        assert_eq!(
            graph.pose_in_root("nope"),
            Err(PoseError::UnknownFrame {
                frame: "nope".to_owned()
            })
        );
        assert!(graph.relative_pose("base", "nope").is_err());
        assert_eq!(graph.parent_name("nope"), None);
        assert_eq!(graph.children_names("nope").count(), 0);
    }

    #[test]
    fn test_relative_pose_to_self_is_identity() {
        let mut graph = TransformGraph::new();
        graph.apply(&TransformUpdate::new(
            "world",
            "base",
            FrameTransform::new([1.0, 2.0, 3.0], DQuat::from_rotation_x(0.3)),
            Timestamp::ZERO,
        ));
        graph.apply(&translation("base", "arm", [0.0, 1.0, 0.0], 0));

        for name in ["world", "base", "arm"] {
            let pose = graph.relative_pose(name, name).unwrap();
            assert!(pose.abs_diff_eq(DAffine3::IDENTITY, 1e-12), "{name}: {pose:?}");
        }
    }

    #[test]
    fn test_relative_pose_between_siblings() {
        let mut graph = TransformGraph::new();
        graph.apply(&translation("world", "left", [-1.0, 0.0, 0.0], 0));
        graph.apply(&translation("world", "right", [1.0, 0.0, 0.0], 0));

        let right_from_left = graph.relative_pose("left", "right").unwrap();
        assert_eq!(right_from_left.translation, DVec3::new(-2.0, 0.0, 0.0));
    }

    #[test]
    fn test_world_transforms_follow_updates() {
        let mut graph = TransformGraph::new();
        graph.apply(&translation("world", "base", [1.0, 0.0, 0.0], 0));
        graph.apply(&translation("base", "arm", [0.0, 1.0, 0.0], 0));
        assert_eq!(
            graph.pose_in_root("arm").unwrap().translation,
            DVec3::new(1.0, 1.0, 0.0)
        );

        graph.apply(&translation("world", "base", [2.0, 0.0, 0.0], 5));
        assert_eq!(
            graph.pose_in_root("arm").unwrap().translation,
            DVec3::new(2.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_reset() {
        let mut graph = TransformGraph::new();
        graph.apply(&translation("world", "odom", [1.0, 0.0, 0.0], 0));
        graph.apply(&translation("odom", "base", [0.0, 1.0, 0.0], 0).with_static(true));
        graph.apply(&translation("base", "camera", [0.0, 0.0, 1.0], 0).with_static(true));
        graph.apply(&translation("camera", "target", [1.0, 1.0, 1.0], 0));

        let mut cleared = graph.clone();
        cleared.reset(false);
        assert!(cleared.is_empty());

        graph.reset(true);
        similar_asserts::assert_eq!(
            graph.frame_names().collect::<Vec<_>>(),
            vec!["base", "camera", "odom"]
        );
        assert!(graph.frame("odom").unwrap().is_awaiting_definition());
        assert_eq!(graph.parent_name("base"), Some("odom"));
        assert_eq!(graph.parent_name("camera"), Some("base"));
        assert_eq!(
            graph.pose_in_root("camera").unwrap().translation,
            DVec3::new(0.0, 1.0, 1.0)
        );

        // The kept links are still write-once.
        assert_eq!(
            graph.apply(&translation("world", "base", [0.0, 0.0, 0.0], 1)),
            ApplyOutcome::ParentConflict
        );
        // The dropped ones can be replayed.
        assert!(graph.apply(&translation("world", "odom", [1.0, 0.0, 0.0], 0)).is_applied());
        assert_eq!(
            graph.pose_in_root("camera").unwrap().translation,
            DVec3::new(1.0, 1.0, 1.0)
        );
    }
}
