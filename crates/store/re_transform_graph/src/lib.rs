//! Coordinate frame tracking for robot telemetry playback.
//!
//! A [`TransformGraph`] holds the latest transform of every frame relative to its parent and
//! answers "where is X relative to Y right now" from cached world matrices.
//!
//! To answer "where was X relative to Y at time T", the graph walks a [`TransformHistory`],
//! usually a [`TimeWindowedHistory`] that retains the last few seconds of update batches.
//!
//! [`TransformTracker`] feeds both from a single stream of [`UpdateBatch`]es,
//! which [`decode`] produces from `tf` messages.

mod config;
pub mod decode;
mod frame_transform;
mod history;
mod timestamp;
mod tracker;
mod transform_graph;
mod update;

pub use config::{ConfigError, ENV_TF_HISTORY_WINDOW_SECS, TransformHistoryConfig};
pub use decode::{DecodeError, DecodeOptions, decode_tf_message_json};
pub use frame_transform::FrameTransform;
pub use history::{TimeWindowedHistory, TransformHistory};
pub use timestamp::Timestamp;
pub use tracker::{PoseSource, ResolvedPose, TransformTracker};
pub use transform_graph::{ApplyOutcome, Frame, FrameState, PoseError, TransformGraph};
pub use update::{TransformUpdate, UpdateBatch};
