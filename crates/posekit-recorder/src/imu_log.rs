//! CSV log of [`ImuRecord`]s with a fixed column layout.

use std::path::{Path, PathBuf};

use posekit_motion::ImuRecord;

use crate::csv_writer::{CsvWriter, CsvWriterConfig};
use crate::error::Result;

/// Columns written for every IMU row (`unix_ms` is appended when enabled).
pub const IMU_COLUMNS: [&str; 10] = [
    "instance_id",
    "name",
    "timestamp",
    "frame",
    "gyro_x",
    "gyro_y",
    "gyro_z",
    "accel_x",
    "accel_y",
    "accel_z",
];

pub struct ImuLog {
    writer: CsvWriter,
}

impl ImuLog {
    /// Open a log; any columns already present in `config` are replaced by
    /// [`IMU_COLUMNS`].
    pub fn create(config: CsvWriterConfig) -> Result<Self> {
        let config = config.with_columns(IMU_COLUMNS);
        Ok(Self {
            writer: CsvWriter::create(&config)?,
        })
    }

    pub fn record(&mut self, rec: &ImuRecord) -> Result<()> {
        self.writer
            .push(rec.instance_id)
            .push(&rec.name)
            .push(rec.timestamp)
            .push(rec.frame)
            .push_vec3(rec.gyroscope)
            .push_vec3(rec.acceleration);
        self.writer.write_line()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub fn rows_written(&self) -> u64 {
        self.writer.rows_written()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    pub fn close(self) -> Result<PathBuf> {
        self.writer.close()
    }
}
