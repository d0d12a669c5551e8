//! `posekit-recorder` – on-disk capture of motion sessions.
//!
//! # Modules
//!
//! - [`paths`] – collision-free file and directory names
//!   ([`unique_file_path`][paths::unique_file_path],
//!   [`create_unique_dir`][paths::create_unique_dir]).
//! - [`csv_writer`] – [`CsvWriter`][csv_writer::CsvWriter]: header plus rows,
//!   built field by field, with an optional trailing `unix_ms` column.
//! - [`imu_log`] – [`ImuLog`][imu_log::ImuLog]: CSV layout for
//!   [`ImuRecord`][posekit_motion::ImuRecord]s.
//! - [`json_writer`] – [`JsonWriter`][json_writer::JsonWriter]: pretty JSON
//!   snapshots inside a session directory.
//! - [`wav`] – [`AudioClip`][wav::AudioClip] and 16-bit PCM WAV export.
//! - [`log_writer`] – [`LogWriter`][log_writer::LogWriter]: session log file
//!   with an in-memory tail, usable as a `tracing` writer.

pub mod csv_writer;
pub mod error;
pub mod imu_log;
pub mod json_writer;
pub mod log_writer;
pub mod paths;
pub mod wav;

pub use csv_writer::{CsvWriter, CsvWriterConfig};
pub use error::{RecorderError, Result};
pub use imu_log::ImuLog;
pub use json_writer::{JsonWriter, JsonWriterConfig};
pub use log_writer::LogWriter;
pub use wav::{AudioClip, encode_wav, save_wav};
