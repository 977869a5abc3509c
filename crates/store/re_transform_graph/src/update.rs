use serde::{Deserialize, Serialize};

use crate::{FrameTransform, Timestamp};

/// A single parent→child transform record, the unit applied to a [`crate::TransformGraph`].
///
/// Records from one feed arrive in time order, but feeds get merged,
/// so older and duplicate records for the same child are expected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    pub parent: String,
    pub child: String,
    pub transform: FrameTransform,
    pub stamp: Timestamp,

    /// Static transforms are assumed to never change once defined.
    pub is_static: bool,
}

impl TransformUpdate {
    #[inline]
    pub fn new(
        parent: impl Into<String>,
        child: impl Into<String>,
        transform: FrameTransform,
        stamp: Timestamp,
    ) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            transform,
            stamp,
            is_static: false,
        }
    }

    #[inline]
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

/// All transform records that arrived together, e.g. one decoded `tf` message.
///
/// This is what gets retained by a [`crate::TimeWindowedHistory`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBatch {
    /// The time this batch was logged at. Orders the history.
    pub stamp: Timestamp,

    pub updates: Vec<TransformUpdate>,
}

impl UpdateBatch {
    #[inline]
    pub fn new(stamp: Timestamp, updates: Vec<TransformUpdate>) -> Self {
        Self { stamp, updates }
    }

    /// A batch holding a single record, stamped with that record's time.
    #[inline]
    pub fn single(update: TransformUpdate) -> Self {
        Self {
            stamp: update.stamp,
            updates: vec![update],
        }
    }

    /// The record for `child` stamped at or before `time`, optionally restricted to one `parent`.
    ///
    /// If several qualify, the newest stamp wins. On a tie the record that came later in the batch wins.
    pub fn latest_for_child_at(
        &self,
        child: &str,
        parent: Option<&str>,
        time: Timestamp,
    ) -> Option<&TransformUpdate> {
        self.updates
            .iter()
            .filter(|update| {
                update.child == child
                    && update.stamp <= time
                    && parent.is_none_or(|parent| parent == update.parent)
            })
            .max_by_key(|update| update.stamp)
    }
}
