use glam::DAffine3;

use crate::{FrameTransform, Timestamp};

/// Index of a frame in the graph's arena.
///
/// Only meaningful for the graph that handed it out, and only until its next reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct FrameId(u32);

impl nohash_hasher::IsEnabled for FrameId {}

impl FrameId {
    #[inline]
    pub(super) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub(super) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Whether a frame's own transform is known yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// Only ever referenced as somebody's parent.
    ///
    /// Treated as identity-transformed and as a root for time-travel walks.
    AwaitingDefinition,

    /// At least one update named this frame as its child.
    Defined,
}

/// A node in the transform forest.
#[derive(Clone, Debug)]
pub struct Frame {
    pub(super) name: String,

    /// Write-once: once set, only the transform along this link changes.
    pub(super) parent: Option<FrameId>,

    pub(super) state: FrameState,

    /// Parent-from-child, identity while awaiting definition.
    pub(super) transform: FrameTransform,

    /// Stamp of the update that produced [`Self::transform`].
    pub(super) last_update: Timestamp,

    pub(super) is_static: bool,

    /// Only valid while the graph isn't dirty.
    pub(super) world_from_frame: DAffine3,
}

impl Frame {
    pub(super) fn new_awaiting_definition(name: String, is_static: bool) -> Self {
        Self {
            name,
            parent: None,
            state: FrameState::AwaitingDefinition,
            transform: FrameTransform::IDENTITY,
            last_update: Timestamp::NEVER,
            is_static,
            world_from_frame: DAffine3::IDENTITY,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[inline]
    pub fn is_awaiting_definition(&self) -> bool {
        self.state == FrameState::AwaitingDefinition
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Static and not-yet-defined frames look the same at any point in time.
    #[inline]
    pub fn is_time_invariant(&self) -> bool {
        self.is_static || self.is_awaiting_definition()
    }

    #[inline]
    pub fn transform(&self) -> FrameTransform {
        self.transform
    }

    #[inline]
    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }
}
