//! `posekit-motion` – motion estimation from observed poses.
//!
//! Turns a stream of poses pushed by a host (game engine, replay file,
//! simulator) into the readings a physical IMU on the tracked object would
//! produce.
//!
//! # Modules
//!
//! - [`estimator`] – [`MotionEstimator`][estimator::MotionEstimator]: per-tick
//!   shortest-arc angular velocity and gravity-compensated linear acceleration
//!   in world and body frames.
//! - [`imu`] – [`ImuSensor`][imu::ImuSensor]: named, identified wrapper that
//!   counts frames and emits loggable [`ImuRecord`][imu::ImuRecord]s.
//! - [`follower`] – [`Follower`][follower::Follower]: keeps a child pose
//!   rigidly locked to a moving parent.
//! - [`frame_counter`] – [`FrameCounter`][frame_counter::FrameCounter]: raw and
//!   smoothed frame rate of the host loop.

pub mod estimator;
pub mod follower;
pub mod frame_counter;
pub mod imu;

pub use estimator::{EstimatorConfig, EstimatorState, MotionEstimator, angular_velocity};
pub use follower::Follower;
pub use frame_counter::FrameCounter;
pub use imu::{ImuRecord, ImuSensor, UpdateMode};
