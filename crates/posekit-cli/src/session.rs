//! One recording run: a virtual IMU, its optional CSV log and the running
//! statistics that end up in the [`RunSummary`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use posekit_motion::{ImuRecord, ImuSensor, UpdateMode};
use posekit_recorder::ImuLog;
use posekit_recorder::json_writer::save_json;
use posekit_types::{MotionReading, PoseSample, Quaternion, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::Result;

/// JSON summary written next to the IMU log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub instance_id: Uuid,
    pub name: String,
    /// What fed the sensor (`simulate`, or the input file path).
    pub source: String,
    pub update_mode: UpdateMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Readings produced after seeding.
    pub frames: u64,
    /// Samples dropped because their time step was invalid.
    pub rejected: u64,
    /// Sum of accepted time steps (s).
    pub elapsed_secs: f64,
    /// Largest body-frame angular speed seen (rad/s).
    pub peak_angular_speed: f32,
    /// Largest body-frame acceleration magnitude seen (m/s²).
    pub peak_acceleration: f32,
    pub final_reading: MotionReading,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_fps: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

pub struct Session {
    sensor: ImuSensor,
    log: Option<ImuLog>,
    source: String,
    update_mode: UpdateMode,
    started_at: DateTime<Utc>,
    rejected: u64,
    elapsed_secs: f64,
    peak_angular_speed: f32,
    peak_acceleration: f32,
}

impl Session {
    /// Create the sensor and, when `cfg.record` is set, open its CSV log.
    pub fn start(name: &str, source: impl Into<String>, cfg: &Config, file_name: Option<&str>) -> Result<Self> {
        let sensor = ImuSensor::new(name, cfg.estimator_config());
        let log = if cfg.record {
            let log = ImuLog::create(cfg.csv_writer_config(file_name))?;
            Some(log)
        } else {
            None
        };
        let source = source.into();
        info!(
            instance_id = %sensor.instance_id(),
            name,
            source = %source,
            mode = %cfg.update_mode,
            recording = log.is_some(),
            "session started"
        );
        Ok(Self {
            sensor,
            log,
            source,
            update_mode: cfg.update_mode,
            started_at: Utc::now(),
            rejected: 0,
            elapsed_secs: 0.0,
            peak_angular_speed: 0.0,
            peak_acceleration: 0.0,
        })
    }

    pub fn sensor(&self) -> &ImuSensor {
        &self.sensor
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Seed the sensor with the starting pose and log the frame-0 row.
    pub fn seed(&mut self, orientation: Quaternion, position: Vec3, timestamp: f64) -> Result<ImuRecord> {
        let rec = self.sensor.seed(orientation, position, timestamp);
        if let Some(log) = self.log.as_mut() {
            log.record(&rec)?;
        }
        Ok(rec)
    }

    /// Feed one pose.  A sample with an invalid time step is counted and
    /// skipped (`Ok(None)`); only recorder failures are errors.
    pub fn step(&mut self, sample: &PoseSample, timestamp: f64) -> Result<Option<ImuRecord>> {
        let rec = match self.sensor.step(sample, timestamp) {
            Ok(rec) => rec,
            Err(e) => {
                self.rejected += 1;
                warn!(timestamp, dt = sample.dt, error = %e, "sample rejected");
                return Ok(None);
            }
        };
        self.elapsed_secs += f64::from(sample.dt);
        self.peak_angular_speed = self.peak_angular_speed.max(rec.gyroscope.length());
        self.peak_acceleration = self.peak_acceleration.max(rec.acceleration.length());
        if let Some(log) = self.log.as_mut() {
            log.record(&rec)?;
        }
        Ok(Some(rec))
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(log) = self.log.as_mut() {
            log.flush()?;
        }
        Ok(())
    }

    /// Close the log, write the JSON summary beside it and return both.
    pub fn finish(self, smoothed_fps: Option<f32>) -> Result<(RunSummary, Option<PathBuf>)> {
        let csv_path = match self.log {
            Some(log) => Some(log.close()?),
            None => None,
        };
        let summary = RunSummary {
            instance_id: self.sensor.instance_id(),
            name: self.sensor.name().to_string(),
            source: self.source,
            update_mode: self.update_mode,
            started_at: self.started_at,
            finished_at: Utc::now(),
            frames: self.sensor.frame(),
            rejected: self.rejected,
            elapsed_secs: self.elapsed_secs,
            peak_angular_speed: self.peak_angular_speed,
            peak_acceleration: self.peak_acceleration,
            final_reading: self.sensor.reading(),
            smoothed_fps,
            csv_path,
        };
        let summary_path = match summary.csv_path.as_deref() {
            Some(csv) => Some(save_json(&csv.with_extension("json"), &summary)?),
            None => None,
        };
        info!(
            frames = summary.frames,
            rejected = summary.rejected,
            elapsed_secs = summary.elapsed_secs,
            "session finished"
        );
        Ok((summary, summary_path))
    }
}
