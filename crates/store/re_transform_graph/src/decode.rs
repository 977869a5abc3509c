//! Decoding of `tf2_msgs/TFMessage`-shaped JSON into [`UpdateBatch`]es.
//!
//! Malformed records are rejected here, so the graph only ever sees well-formed updates.

use glam::{DQuat, DVec3, DVec4};
use serde::Deserialize;

use crate::{FrameTransform, Timestamp, TransformUpdate, UpdateBatch};

/// Topic that carries transforms that never change.
pub const TF_STATIC_TOPIC: &str = "/tf_static";

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("failed to parse tf message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tf message contains no transforms")]
    EmptyMessage,

    #[error("transform #{index} has an empty {field}")]
    EmptyFrameId { index: usize, field: &'static str },

    #[error("transform #{index} from `{parent}` to `{child}` has a non-finite translation")]
    NonFiniteTranslation {
        index: usize,
        parent: String,
        child: String,
    },

    #[error("transform #{index} from `{parent}` to `{child}` has a rotation that can't be normalized")]
    InvalidQuaternion {
        index: usize,
        parent: String,
        child: String,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Marks every decoded update as static.
    pub is_static: bool,
}

impl DecodeOptions {
    /// Options matching the topic a message was received on.
    pub fn for_topic(topic: &str) -> Self {
        Self {
            is_static: is_static_topic(topic),
        }
    }
}

/// Is this the topic for static transforms, with or without leading slash?
pub fn is_static_topic(topic: &str) -> bool {
    topic.strip_prefix('/').unwrap_or(topic) == &TF_STATIC_TOPIC[1..]
}

// ---

#[derive(Debug, Deserialize)]
struct TfMessage {
    transforms: Vec<TransformStamped>,
}

#[derive(Debug, Deserialize)]
struct TransformStamped {
    header: Header,
    child_frame_id: String,
    transform: Transform,
}

/// Any extra fields, like the ROS 1 `seq`, are ignored.
#[derive(Debug, Deserialize)]
struct Header {
    stamp: Timestamp,
    frame_id: String,
}

#[derive(Debug, Deserialize)]
struct Transform {
    translation: Vector3,
    rotation: Quaternion,
}

#[derive(Debug, Deserialize)]
struct Vector3 {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Deserialize)]
struct Quaternion {
    x: f64,
    y: f64,
    z: f64,
    w: f64,
}

// ---

/// Decodes a single tf message.
///
/// The batch is stamped with `receive_time` if given, otherwise with the newest header stamp.
/// Frame ids lose their leading slash, so `/base_link` and `base_link` name the same frame.
/// Rotations get normalized.
pub fn decode_tf_message_json(
    json: &str,
    receive_time: Option<Timestamp>,
    options: DecodeOptions,
) -> Result<UpdateBatch, DecodeError> {
    re_tracing::profile_function!();

    let TfMessage { transforms } = serde_json::from_str(json)?;
    if transforms.is_empty() {
        return Err(DecodeError::EmptyMessage);
    }

    let updates = transforms
        .into_iter()
        .enumerate()
        .map(|(index, transform)| decode_transform(index, transform, options))
        .collect::<Result<Vec<_>, _>>()?;

    let stamp = receive_time
        .or_else(|| updates.iter().map(|update| update.stamp).max())
        .unwrap_or(Timestamp::NEVER);

    Ok(UpdateBatch::new(stamp, updates))
}

fn decode_transform(
    index: usize,
    transform: TransformStamped,
    options: DecodeOptions,
) -> Result<TransformUpdate, DecodeError> {
    let TransformStamped {
        header,
        child_frame_id,
        transform: Transform {
            translation,
            rotation,
        },
    } = transform;

    let parent = frame_name(&header.frame_id);
    if parent.is_empty() {
        return Err(DecodeError::EmptyFrameId {
            index,
            field: "frame_id",
        });
    }
    let child = frame_name(&child_frame_id);
    if child.is_empty() {
        return Err(DecodeError::EmptyFrameId {
            index,
            field: "child_frame_id",
        });
    }

    let translation = DVec3::new(translation.x, translation.y, translation.z);
    if !translation.is_finite() {
        return Err(DecodeError::NonFiniteTranslation {
            index,
            parent: parent.to_owned(),
            child: child.to_owned(),
        });
    }

    let Some(rotation) = DVec4::new(rotation.x, rotation.y, rotation.z, rotation.w)
        .try_normalize()
        .map(DQuat::from_vec4)
    else {
        return Err(DecodeError::InvalidQuaternion {
            index,
            parent: parent.to_owned(),
            child: child.to_owned(),
        });
    };

    Ok(TransformUpdate::new(
        parent,
        child,
        FrameTransform::new(translation, rotation),
        header.stamp,
    )
    .with_static(options.is_static))
}

fn frame_name(frame_id: &str) -> &str {
    frame_id.strip_prefix('/').unwrap_or(frame_id)
}
