//! Virtual IMU attached to one tracked object.
//!
//! [`ImuSensor`] is the host-facing wrapper around a [`MotionEstimator`]: it
//! carries the object's identity, counts processed frames and packages every
//! reading as an [`ImuRecord`] ready to be logged.  Records carry the
//! **body-frame** vectors, matching what a physical IMU mounted on the object
//! would measure; the world-frame vectors stay available through
//! [`ImuSensor::reading`].

use std::fmt;
use std::str::FromStr;

use posekit_types::{MotionReading, PoseError, PoseSample, Quaternion, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::estimator::{EstimatorConfig, MotionEstimator};

/// How the host drives the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// A constant simulation step is used as `dt`.
    #[default]
    Fixed,
    /// The measured time between consecutive samples is used as `dt`.
    Frame,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::Fixed => write!(f, "fixed"),
            UpdateMode::Frame => write!(f, "frame"),
        }
    }
}

impl FromStr for UpdateMode {
    type Err = PoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(UpdateMode::Fixed),
            "frame" => Ok(UpdateMode::Frame),
            other => Err(PoseError::InvalidArgument(format!(
                "unknown update mode '{other}' (expected 'fixed' or 'frame')"
            ))),
        }
    }
}

/// One logged IMU row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuRecord {
    pub instance_id: Uuid,
    pub name: String,
    /// Host time of the sample (seconds).
    pub timestamp: f64,
    /// Number of readings produced so far; the seeding sample is frame 0.
    pub frame: u64,
    /// Body-frame angular velocity (rad/s).
    pub gyroscope: Vec3,
    /// Body-frame linear acceleration (m/s²), gravity reaction included.
    pub acceleration: Vec3,
}

/// A named virtual IMU.
#[derive(Debug, Clone)]
pub struct ImuSensor {
    instance_id: Uuid,
    name: String,
    estimator: MotionEstimator,
    frame: u64,
}

impl ImuSensor {
    /// Create a sensor with a fresh random instance id.
    pub fn new(name: impl Into<String>, config: EstimatorConfig) -> Self {
        Self::with_id(Uuid::new_v4(), name, config)
    }

    pub fn with_id(instance_id: Uuid, name: impl Into<String>, config: EstimatorConfig) -> Self {
        Self {
            instance_id,
            name: name.into(),
            estimator: MotionEstimator::new(config),
            frame: 0,
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Full world + body reading from the last step.
    pub fn reading(&self) -> MotionReading {
        self.estimator.reading()
    }

    pub fn estimator(&self) -> &MotionEstimator {
        &self.estimator
    }

    /// Seed from the object's starting pose and return the zero record for
    /// frame 0.
    pub fn seed(&mut self, orientation: Quaternion, position: Vec3, timestamp: f64) -> ImuRecord {
        self.estimator.seed(orientation, position);
        self.frame = 0;
        self.record(timestamp)
    }

    /// Feed the next pose.  On error the sensor state (including the frame
    /// count) is unchanged.
    pub fn step(&mut self, sample: &PoseSample, timestamp: f64) -> Result<ImuRecord, PoseError> {
        let was_seeded = self.estimator.is_seeded();
        self.estimator.update_sample(sample)?;
        if was_seeded {
            self.frame += 1;
        }
        Ok(self.record(timestamp))
    }

    fn record(&self, timestamp: f64) -> ImuRecord {
        let reading = self.estimator.reading();
        ImuRecord {
            instance_id: self.instance_id,
            name: self.name.clone(),
            timestamp,
            frame: self.frame,
            gyroscope: reading.angular_velocity_body,
            acceleration: reading.linear_acceleration_body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_mode_parses_case_insensitively() {
        assert_eq!("Fixed".parse::<UpdateMode>().unwrap(), UpdateMode::Fixed);
        assert_eq!(" frame ".parse::<UpdateMode>().unwrap(), UpdateMode::Frame);
        assert!("sometimes".parse::<UpdateMode>().is_err());
        assert_eq!(UpdateMode::Frame.to_string(), "frame");
    }

    #[test]
    fn seed_returns_zero_record_at_frame_zero() {
        let mut imu = ImuSensor::new("probe", EstimatorConfig::default());
        let rec = imu.seed(Quaternion::identity(), Vec3::zero(), 1.5);
        assert_eq!(rec.frame, 0);
        assert_eq!(rec.name, "probe");
        assert_eq!(rec.instance_id, imu.instance_id());
        assert_eq!(rec.gyroscope, Vec3::zero());
        assert_eq!(rec.acceleration, Vec3::zero());
        assert!((rec.timestamp - 1.5).abs() < 1e-12);
    }

    #[test]
    fn step_counts_frames_and_reports_body_vectors() {
        let mut imu = ImuSensor::new("probe", EstimatorConfig::default());
        imu.seed(Quaternion::identity(), Vec3::zero(), 0.0);

        // Rolled 90° about X.  The gravity reaction keeps its magnitude.
        let roll = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2);
        let rec = imu
            .step(&PoseSample::new(roll, Vec3::zero(), 0.02), 0.02)
            .unwrap();
        assert_eq!(rec.frame, 1);
        assert!((rec.acceleration.length() - 9.81).abs() < 1e-3);
        assert_eq!(rec.acceleration, imu.reading().linear_acceleration_body);

        let rec = imu
            .step(&PoseSample::new(roll, Vec3::zero(), 0.02), 0.04)
            .unwrap();
        assert_eq!(rec.frame, 2);
        assert!(rec.gyroscope.length() < 1e-3);
        // Body −Z points along world +Y after the roll.
        assert!((rec.acceleration.z + 9.81).abs() < 1e-3, "{}", rec.acceleration);
    }

    #[test]
    fn failed_step_keeps_frame_count() {
        let mut imu = ImuSensor::new("probe", EstimatorConfig::default());
        imu.seed(Quaternion::identity(), Vec3::zero(), 0.0);
        let bad = PoseSample::new(Quaternion::identity(), Vec3::zero(), 0.0);
        assert!(imu.step(&bad, 0.0).is_err());
        assert_eq!(imu.frame(), 0);
    }

    #[test]
    fn unseeded_first_step_seeds_at_frame_zero() {
        let mut imu = ImuSensor::new("probe", EstimatorConfig::default());
        let rec = imu
            .step(&PoseSample::new(Quaternion::identity(), Vec3::zero(), 0.02), 0.0)
            .unwrap();
        assert_eq!(rec.frame, 0);
        assert!(imu.estimator().is_seeded());
    }

    #[test]
    fn record_serializes_to_json() {
        let id = Uuid::nil();
        let mut imu = ImuSensor::with_id(id, "probe", EstimatorConfig::default());
        let rec = imu.seed(Quaternion::identity(), Vec3::zero(), 0.0);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["instance_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["frame"], 0);
        assert_eq!(json["gyroscope"]["x"], 0.0);
    }
}
