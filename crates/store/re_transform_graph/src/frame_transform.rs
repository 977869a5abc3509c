use glam::{DAffine3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A rigid transform from a child frame into its parent's coordinate system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameTransform {
    pub translation: DVec3,

    /// Expected to be normalized.
    pub rotation: DQuat,
}

impl Default for FrameTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FrameTransform {
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    #[inline]
    pub fn new(translation: impl Into<DVec3>, rotation: DQuat) -> Self {
        Self {
            translation: translation.into(),
            rotation,
        }
    }

    #[inline]
    pub fn from_translation(translation: impl Into<DVec3>) -> Self {
        Self::new(translation, DQuat::IDENTITY)
    }

    #[inline]
    pub fn parent_from_child(&self) -> DAffine3 {
        DAffine3::from_rotation_translation(self.rotation, self.translation)
    }
}

impl From<FrameTransform> for DAffine3 {
    #[inline]
    fn from(transform: FrameTransform) -> Self {
        transform.parent_from_child()
    }
}
