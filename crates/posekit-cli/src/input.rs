//! Pose CSV input.
//!
//! Expected format, one header line then one pose per row:
//!
//! ```text
//! timestamp,qw,qx,qy,qz,px,py,pz
//! 0.00,1,0,0,0,0,0,0
//! 0.02,0.9999,0,0.0141,0,0,0,0.01
//! ```
//!
//! Quaternions are normalized on read.  Line numbers in errors are 1-based
//! and count the header as line 1.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use posekit_types::{Quaternion, Vec3};

use crate::errors::{CliError, Result};

pub const POSE_COLUMNS: [&str; 8] = ["timestamp", "qw", "qx", "qy", "qz", "px", "py", "pz"];

/// One row of a pose file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseRow {
    pub timestamp: f64,
    pub orientation: Quaternion,
    pub position: Vec3,
}

/// Parse every pose row of the file at `path`.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<PoseRow>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| CliError::PoseFileNotFound(path.display().to_string()))?;
    let rows = parse_reader(file)?;
    if rows.is_empty() {
        return Err(CliError::NoSamples(path.display().to_string()));
    }
    Ok(rows)
}

pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<PoseRow>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let record = result.map_err(|e| CliError::PoseFormat {
            line,
            message: format!("CSV error: {e}"),
        })?;
        rows.push(parse_record(&record, line)?);
    }
    Ok(rows)
}

fn parse_record(record: &StringRecord, line: usize) -> Result<PoseRow> {
    if record.len() < POSE_COLUMNS.len() {
        return Err(CliError::PoseFormat {
            line,
            message: format!(
                "Expected at least {} columns, found {}",
                POSE_COLUMNS.len(),
                record.len()
            ),
        });
    }

    let field = |i: usize| -> Result<f64> {
        let value: f64 = record[i].parse().map_err(|e| CliError::PoseFormat {
            line,
            message: format!("Invalid {}: {e}", POSE_COLUMNS[i]),
        })?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CliError::PoseFormat {
                line,
                message: format!("{} must be finite", POSE_COLUMNS[i]),
            })
        }
    };

    let timestamp = field(0)?;
    let raw = Quaternion::new(field(1)? as f32, field(2)? as f32, field(3)? as f32, field(4)? as f32);
    if raw.norm() < 1e-6 {
        return Err(CliError::PoseFormat {
            line,
            message: "Orientation quaternion has zero length".to_string(),
        });
    }
    let position = Vec3::new(field(5)? as f32, field(6)? as f32, field(7)? as f32);

    Ok(PoseRow {
        timestamp,
        orientation: raw.normalized(),
        position,
    })
}

/// `X,Y,Z` command-line vector.
pub fn parse_vec3(s: &str) -> std::result::Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,Z but got '{s}'"));
    }
    let mut out = [0.0f32; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f32>()
            .map_err(|e| format!("invalid component '{part}': {e}"))?;
        if !slot.is_finite() {
            return Err(format!("component '{part}' is not finite"));
        }
    }
    Ok(Vec3::from(out))
}
