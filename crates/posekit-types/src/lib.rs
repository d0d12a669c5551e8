//! `posekit-types` – shared vocabulary for the posekit workspace.
//!
//! # Modules
//!
//! - [`math`] – [`Vec3`], [`Quaternion`] and [`Pose`]: the single plain
//!   vector / rotation / rigid-transform representation used by every crate.
//! - [`packing`] – [`remap`][packing::remap] and the
//!   [`pack_vec3`][packing::pack_vec3] / [`unpack_vec3`][packing::unpack_vec3]
//!   integer encoding.
//!
//! The crate root defines the sample and reading types exchanged between a
//! host and the motion estimator, plus the shared [`PoseError`].

pub mod math;
pub mod packing;

pub use math::{Pose, Quaternion, Vec3};
pub use packing::{pack_vec3, remap, unpack_vec3};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard gravitational acceleration (m/s²).
pub const STANDARD_GRAVITY: f32 = 9.81;

/// One observed pose, pushed by the host once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Unit quaternion; normalizing is the caller's job.
    pub orientation: Quaternion,
    pub position: Vec3,
    /// Seconds elapsed since the previous sample.
    pub dt: f32,
}

impl PoseSample {
    pub fn new(orientation: Quaternion, position: Vec3, dt: f32) -> Self {
        Self {
            orientation,
            position,
            dt,
        }
    }
}

/// Angular velocity (rad/s) and linear acceleration (m/s²) in world and body
/// frames, as produced by one estimator update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionReading {
    pub angular_velocity_world: Vec3,
    pub linear_acceleration_world: Vec3,
    pub angular_velocity_body: Vec3,
    pub linear_acceleration_body: Vec3,
}

impl MotionReading {
    /// All four vectors zero.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Errors raised by posekit math and estimation routines.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PoseError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
