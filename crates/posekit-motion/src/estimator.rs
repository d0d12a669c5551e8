//! Motion Estimator.
//!
//! Derives gyroscope-style angular velocity and accelerometer-style linear
//! acceleration from a stream of poses, the way a virtual IMU strapped to a
//! tracked object would report them.
//!
//! For every tick the estimator compares the current pose with the previous
//! one:
//!
//! ```text
//! dq      = q_now * q_prev⁻¹            (flipped to w ≥ 0: shortest arc)
//! ω_world = axis(dq) * angle(dq) / dt   (angle wrapped into (−180°, 180°])
//! v       = (p_now − p_prev) / dt
//! a_world = (v − v_prev) / dt − g
//! ω_body  = q_now⁻¹ * ω_world
//! a_body  = q_now⁻¹ * a_world
//! ```
//!
//! The first pose only seeds the state and yields a zero [`MotionReading`].
//!
//! # Example
//!
//! ```rust
//! use posekit_motion::estimator::{EstimatorConfig, MotionEstimator};
//! use posekit_types::{Quaternion, Vec3};
//!
//! let mut est = MotionEstimator::new(EstimatorConfig::default());
//! est.update(Quaternion::identity(), Vec3::zero(), 0.02).unwrap(); // seeds
//!
//! let r = est.update(Quaternion::identity(), Vec3::zero(), 0.02).unwrap();
//! assert_eq!(r.angular_velocity_world, Vec3::zero());
//! // At rest the accelerometer reads the reaction to gravity.
//! assert!((r.linear_acceleration_world.y - 9.81).abs() < 1e-5);
//! ```

use posekit_types::{MotionReading, PoseError, PoseSample, Quaternion, STANDARD_GRAVITY, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rotations smaller than this (degrees) report zero angular velocity.
pub const ANGLE_EPSILON_DEG: f32 = 1e-6;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Static estimator parameters, fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Gravity vector in the world frame (m/s²).  Subtracted from every
    /// acceleration sample.  Defaults to standard gravity along −Y.
    pub gravity: Vec3,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -STANDARD_GRAVITY, 0.0),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

/// The rolling previous-sample record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorState {
    pub orientation: Quaternion,
    pub position: Vec3,
    pub velocity: Vec3,
}

// ────────────────────────────────────────────────────────────────────────────
// Free function
// ────────────────────────────────────────────────────────────────────────────

fn check_dt(dt: f32) -> Result<(), PoseError> {
    if dt > 0.0 && dt.is_finite() {
        Ok(())
    } else {
        Err(PoseError::InvalidArgument(format!(
            "dt must be positive and finite, got {dt}"
        )))
    }
}

/// World-frame angular velocity (rad/s) that turns `previous` into `current`
/// over `dt` seconds, following the shortest arc.
///
/// Both quaternions must be unit length.  Returns
/// [`PoseError::InvalidArgument`] when `dt` is not positive.
pub fn angular_velocity(previous: Quaternion, current: Quaternion, dt: f32) -> Result<Vec3, PoseError> {
    check_dt(dt)?;

    let mut dq = current.mul(previous.inverse());
    if dq.w < 0.0 {
        dq = dq.negated();
    }

    let (mut angle_deg, axis) = dq.to_axis_angle();
    if angle_deg > 180.0 {
        angle_deg -= 360.0;
    }
    if axis == Vec3::zero() || angle_deg.abs() < ANGLE_EPSILON_DEG {
        return Ok(Vec3::zero());
    }

    Ok(axis * (angle_deg.to_radians() / dt))
}

// ────────────────────────────────────────────────────────────────────────────
// MotionEstimator
// ────────────────────────────────────────────────────────────────────────────

/// Stateful per-object motion estimator.
///
/// Feed one pose per tick through [`MotionEstimator::update`].  Each instance
/// owns its own previous-sample state; track several objects with several
/// estimators.
#[derive(Debug, Clone)]
pub struct MotionEstimator {
    config: EstimatorConfig,
    state: Option<EstimatorState>,
    reading: MotionReading,
}

impl Default for MotionEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

impl MotionEstimator {
    /// Create an unseeded estimator.
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            state: None,
            reading: MotionReading::zero(),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// The stored previous sample, or `None` before the first pose.
    pub fn state(&self) -> Option<&EstimatorState> {
        self.state.as_ref()
    }

    pub fn is_seeded(&self) -> bool {
        self.state.is_some()
    }

    /// The reading produced by the most recent successful update.
    pub fn reading(&self) -> MotionReading {
        self.reading
    }

    /// Seed the state from a known pose at rest, discarding any previous
    /// state.  The next [`update`](Self::update) produces the first real
    /// reading.
    pub fn seed(&mut self, orientation: Quaternion, position: Vec3) {
        debug!(%position, %orientation, "motion estimator seeded");
        self.state = Some(EstimatorState {
            orientation,
            position,
            velocity: Vec3::zero(),
        });
        self.reading = MotionReading::zero();
    }

    /// Forget the stored state; the next update seeds again.
    pub fn reset(&mut self) {
        self.state = None;
        self.reading = MotionReading::zero();
    }

    /// Process one pose observed `dt` seconds after the previous one.
    ///
    /// The first call seeds the state and returns [`MotionReading::zero`].
    /// A non-positive or non-finite `dt` returns
    /// [`PoseError::InvalidArgument`] and leaves the stored state untouched.
    pub fn update(&mut self, orientation: Quaternion, position: Vec3, dt: f32) -> Result<MotionReading, PoseError> {
        if let Err(e) = check_dt(dt) {
            debug!(dt, "rejected motion update");
            return Err(e);
        }

        let Some(prev) = self.state else {
            self.seed(orientation, position);
            return Ok(self.reading);
        };

        let angular_velocity_world = angular_velocity(prev.orientation, orientation, dt)?;
        let velocity = (position - prev.position) / dt;
        let linear_acceleration_world = (velocity - prev.velocity) / dt - self.config.gravity;

        let to_body = orientation.inverse();
        self.reading = MotionReading {
            angular_velocity_world,
            linear_acceleration_world,
            angular_velocity_body: to_body.rotate(angular_velocity_world),
            linear_acceleration_body: to_body.rotate(linear_acceleration_world),
        };
        self.state = Some(EstimatorState {
            orientation,
            position,
            velocity,
        });

        Ok(self.reading)
    }

    /// [`update`](Self::update) taking a bundled [`PoseSample`].
    pub fn update_sample(&mut self, sample: &PoseSample) -> Result<MotionReading, PoseError> {
        self.update(sample.orientation, sample.position, sample.dt)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_vec_close(a: Vec3, b: Vec3, tol: f32) {
        assert!((a - b).length() < tol, "expected {b}, got {a}");
    }

    fn seeded_at_rest() -> MotionEstimator {
        let mut est = MotionEstimator::default();
        est.seed(Quaternion::identity(), Vec3::zero());
        est
    }

    fn minus_gravity() -> Vec3 {
        -EstimatorConfig::default().gravity
    }

    // ── Seeding ─────────────────────────────────────────────────────────────

    #[test]
    fn first_update_seeds_and_returns_zero() {
        let mut est = MotionEstimator::default();
        assert!(!est.is_seeded());

        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.4);
        let r = est.update(q, Vec3::new(5.0, 1.0, -2.0), 0.02).unwrap();

        assert_eq!(r, MotionReading::zero());
        let state = est.state().unwrap();
        assert_eq!(state.orientation, q);
        assert_eq!(state.position, Vec3::new(5.0, 1.0, -2.0));
        assert_eq!(state.velocity, Vec3::zero());
    }

    #[test]
    fn reset_forgets_state() {
        let mut est = seeded_at_rest();
        est.update(Quaternion::identity(), Vec3::new(1.0, 0.0, 0.0), 0.1).unwrap();
        est.reset();
        assert!(!est.is_seeded());
        assert_eq!(est.reading(), MotionReading::zero());
    }

    // ── Stationary ──────────────────────────────────────────────────────────

    #[test]
    fn stationary_object_reads_minus_gravity() {
        let mut est = seeded_at_rest();
        let r = est.update(Quaternion::identity(), Vec3::zero(), 0.02).unwrap();

        assert_eq!(r.angular_velocity_world, Vec3::zero());
        assert_vec_close(r.linear_acceleration_world, minus_gravity(), 1e-5);
        assert_vec_close(r.linear_acceleration_world, Vec3::new(0.0, 9.81, 0.0), 1e-5);
    }

    #[test]
    fn identical_rotated_poses_give_zero_rate_not_nan() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 2.0, -0.5), 2.1);
        let mut est = MotionEstimator::default();
        est.seed(q, Vec3::new(1.0, 1.0, 1.0));

        for _ in 0..3 {
            let r = est.update(q, Vec3::new(1.0, 1.0, 1.0), 0.01).unwrap();
            assert!(r.angular_velocity_world.is_finite());
            assert!(r.angular_velocity_world.length() < 1e-3);
        }
    }

    #[test]
    fn zero_gravity_config_reads_zero_at_rest() {
        let mut est = MotionEstimator::new(EstimatorConfig {
            gravity: Vec3::zero(),
        });
        est.seed(Quaternion::identity(), Vec3::zero());
        let r = est.update(Quaternion::identity(), Vec3::zero(), 0.02).unwrap();
        assert_eq!(r.linear_acceleration_world, Vec3::zero());
    }

    // ── Angular velocity ────────────────────────────────────────────────────

    #[test]
    fn constant_rate_about_fixed_axis() {
        let axis = Vec3::new(1.0, 2.0, 2.0) / 3.0;
        let omega = 1.5;
        let dt = 0.01;

        let mut est = MotionEstimator::default();
        for i in 0..20 {
            let t = i as f32 * dt;
            let q = Quaternion::from_axis_angle(axis, omega * t);
            let r = est.update(q, Vec3::zero(), dt).unwrap();
            if i > 0 {
                assert_vec_close(r.angular_velocity_world, axis * omega, 1e-3);
            }
        }
    }

    #[test]
    fn negative_rate_reports_negative_direction() {
        let prev = Quaternion::identity();
        let current = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), -0.2);
        let w = angular_velocity(prev, current, 0.1).unwrap();
        assert_vec_close(w, Vec3::new(0.0, -2.0, 0.0), 1e-4);
    }

    #[test]
    fn step_beyond_half_turn_wraps_to_opposite_direction() {
        // A raw 270° step about +Z is the same rotation as −90° about +Z.
        let current = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 1.5 * PI);
        let dt = 0.5;
        let w = angular_velocity(Quaternion::identity(), current, dt).unwrap();
        assert_vec_close(w, Vec3::new(0.0, 0.0, -FRAC_PI_2 / dt), 1e-3);
    }

    #[test]
    fn double_cover_sign_does_not_change_rate() {
        let prev = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.3);
        let current = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.5);
        let a = angular_velocity(prev, current, 0.1).unwrap();
        let b = angular_velocity(prev, current.negated(), 0.1).unwrap();
        assert_vec_close(a, b, 1e-5);
        assert_vec_close(a, Vec3::new(2.0, 0.0, 0.0), 1e-3);
    }

    // ── Linear acceleration ─────────────────────────────────────────────────

    #[test]
    fn constant_velocity_reads_minus_gravity_after_two_calls() {
        let v = Vec3::new(2.0, 0.0, -1.0);
        let dt = 0.5;
        let mut est = MotionEstimator::default();

        for i in 0..6 {
            let p = v * (i as f32 * dt);
            let r = est.update(Quaternion::identity(), p, dt).unwrap();
            if i >= 2 {
                assert_vec_close(r.linear_acceleration_world, minus_gravity(), 1e-4);
            }
        }
    }

    #[test]
    fn constant_acceleration_is_recovered() {
        let a = Vec3::new(0.0, 0.0, 4.0);
        let dt = 0.5;
        let mut est = MotionEstimator::default();

        for i in 0..6 {
            let t = i as f32 * dt;
            let p = a * (0.5 * t * t);
            let r = est.update(Quaternion::identity(), p, dt).unwrap();
            if i >= 2 {
                assert_vec_close(r.linear_acceleration_world, a + minus_gravity(), 1e-4);
            }
        }
    }

    // ── Body frame ──────────────────────────────────────────────────────────

    #[test]
    fn body_frame_rotates_gravity_reaction() {
        // Body yawed +90° about Z: world +Y is body +X.
        let yaw = Quaternion::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let mut est = MotionEstimator::default();
        est.seed(yaw, Vec3::zero());

        let r = est.update(yaw, Vec3::zero(), 0.02).unwrap();
        assert_vec_close(r.linear_acceleration_body, Vec3::new(9.81, 0.0, 0.0), 1e-4);
    }

    #[test]
    fn body_vectors_rotate_back_to_world() {
        let axis = Vec3::new(0.3, -1.0, 0.4).normalized();
        let dt = 0.02;
        let mut est = MotionEstimator::default();

        for i in 0..10 {
            let t = i as f32 * dt;
            let q = Quaternion::from_axis_angle(axis, 2.0 * t);
            let p = Vec3::new(t, t * t, -0.5 * t);
            let r = est.update(q, p, dt).unwrap();

            assert_vec_close(q.rotate(r.angular_velocity_body), r.angular_velocity_world, 1e-3);
            assert_vec_close(
                q.rotate(r.linear_acceleration_body),
                r.linear_acceleration_world,
                1e-3,
            );
        }
    }

    // ── Invalid dt ──────────────────────────────────────────────────────────

    #[test]
    fn zero_dt_is_rejected_without_touching_state() {
        let mut est = seeded_at_rest();
        est.update(Quaternion::identity(), Vec3::new(1.0, 0.0, 0.0), 0.5).unwrap();
        let before = *est.state().unwrap();
        let reading_before = est.reading();

        let err = est
            .update(Quaternion::identity(), Vec3::new(9.0, 9.0, 9.0), 0.0)
            .unwrap_err();
        assert!(matches!(err, PoseError::InvalidArgument(_)));
        assert_eq!(*est.state().unwrap(), before);
        assert_eq!(est.reading(), reading_before);

        // The next valid tick continues from the preserved state.
        let r = est.update(Quaternion::identity(), Vec3::new(2.0, 0.0, 0.0), 0.5).unwrap();
        assert_vec_close(r.linear_acceleration_world, minus_gravity(), 1e-4);
    }

    #[test]
    fn negative_and_nan_dt_are_rejected() {
        let mut est = MotionEstimator::default();
        assert!(est.update(Quaternion::identity(), Vec3::zero(), -0.1).is_err());
        assert!(est.update(Quaternion::identity(), Vec3::zero(), f32::NAN).is_err());
        assert!(est.update(Quaternion::identity(), Vec3::zero(), f32::INFINITY).is_err());
        assert!(!est.is_seeded());
        assert!(angular_velocity(Quaternion::identity(), Quaternion::identity(), 0.0).is_err());
    }

    #[test]
    fn update_sample_matches_update() {
        let mut a = MotionEstimator::default();
        let mut b = MotionEstimator::default();
        let samples = [
            PoseSample::new(Quaternion::identity(), Vec3::zero(), 0.1),
            PoseSample::new(
                Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.1),
                Vec3::new(0.1, 0.0, 0.0),
                0.1,
            ),
        ];
        for s in &samples {
            let ra = a.update_sample(s).unwrap();
            let rb = b.update(s.orientation, s.position, s.dt).unwrap();
            assert_eq!(ra, rb);
        }
    }
}
