//! Row-at-a-time CSV recorder.
//!
//! A [`CsvWriter`] is opened once per recording session.  Callers build each
//! row field by field with [`CsvWriter::push`] (and the vector helpers), then
//! commit it with [`CsvWriter::write_line`].  When `write_unix_time` is set,
//! a `unix_ms` column is appended to the header and every committed row gets
//! the wall-clock Unix time in milliseconds as its last field.
//!
//! # Example
//!
//! ```rust
//! use posekit_recorder::csv_writer::{CsvWriter, CsvWriterConfig};
//! use posekit_types::Vec3;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = CsvWriterConfig::new(dir.path())
//!     .with_file_name("trace")
//!     .with_columns(["label", "x", "y", "z"]);
//!
//! let mut writer = CsvWriter::create(&config).unwrap();
//! writer.push("probe").push_vec3(Vec3::new(1.0, 2.0, 3.0));
//! assert!(writer.write_line().unwrap());
//! let path = writer.close().unwrap();
//! assert!(path.ends_with("trace.csv"));
//! ```

use std::fmt::Display;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Utc;
use posekit_types::{Quaternion, Vec3};
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::paths::{timestamp_stem, unique_file_path, with_ext_appended};

/// Header name of the wall-clock column.
pub const UNIX_MS_COLUMN: &str = "unix_ms";

/// Milliseconds since the Unix epoch (UTC).
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Where and how a [`CsvWriter`] creates its file.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvWriterConfig {
    /// Output directory, created on demand.
    pub dir: PathBuf,
    /// File stem; `None` or empty uses the current `HH-MM-SS`.
    pub file_name: Option<String>,
    /// Header columns.  No header line is written when empty.
    pub columns: Vec<String>,
    pub write_unix_time: bool,
    /// Start numbering at `_0` even for the first file.
    pub append_zero_to_filename: bool,
}

impl CsvWriterConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_name: None,
            columns: Vec::new(),
            write_unix_time: true,
            append_zero_to_filename: false,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unix_time(mut self, enabled: bool) -> Self {
        self.write_unix_time = enabled;
        self
    }

    pub fn with_append_zero(mut self, enabled: bool) -> Self {
        self.append_zero_to_filename = enabled;
        self
    }

    fn stem(&self) -> String {
        match self.file_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => timestamp_stem(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CsvWriter
// ────────────────────────────────────────────────────────────────────────────

/// An open CSV recording.
pub struct CsvWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    payload: Vec<String>,
    write_unix_time: bool,
    rows_written: u64,
}

impl CsvWriter {
    /// Resolve a unique file name, create the file and write the header.
    pub fn create(config: &CsvWriterConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir)?;
        let path = unique_file_path(
            &config.dir,
            &config.stem(),
            "csv",
            config.append_zero_to_filename,
        );

        let file = File::create(&path)?;
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);

        if !config.columns.is_empty() {
            let mut header = config.columns.clone();
            if config.write_unix_time {
                header.push(UNIX_MS_COLUMN.to_string());
            }
            writer.write_record(&header)?;
        }

        info!(path = %path.display(), columns = config.columns.len(), "CSV recorder opened");

        Ok(Self {
            path,
            writer,
            payload: Vec::new(),
            write_unix_time: config.write_unix_time,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows committed so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Fields pushed since the last committed row.
    pub fn pending_fields(&self) -> usize {
        self.payload.len()
    }

    /// Append one field to the pending row.
    pub fn push<T: Display>(&mut self, value: T) -> &mut Self {
        self.payload.push(value.to_string());
        self
    }

    /// Append `x, y, z` as three fields.
    pub fn push_vec3(&mut self, v: Vec3) -> &mut Self {
        self.push(v.x).push(v.y).push(v.z)
    }

    /// Append `w, x, y, z` as four fields.
    pub fn push_quaternion(&mut self, q: Quaternion) -> &mut Self {
        self.push(q.w).push(q.x).push(q.y).push(q.z)
    }

    /// Commit the pending row.
    ///
    /// Returns `Ok(false)` without writing anything when no field has been
    /// pushed.
    pub fn write_line(&mut self) -> Result<bool> {
        if self.payload.is_empty() {
            return Ok(false);
        }
        let mut row = std::mem::take(&mut self.payload);
        if self.write_unix_time {
            row.push(unix_millis().to_string());
        }
        self.writer.write_record(&row)?;
        self.rows_written += 1;
        Ok(true)
    }

    /// Write a complete row verbatim: no pending payload, no `unix_ms` field.
    pub fn write_fields<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.writer.write_record(fields)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and close the file, returning its path.
    pub fn close(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// One-shot helpers
// ────────────────────────────────────────────────────────────────────────────

/// Write `records` to `path` (`.csv` appended when missing), with a header
/// derived from the record type's field names.  Returns the final path.
pub fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<PathBuf> {
    let path = with_ext_appended(path, "csv");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(path)
}

/// Every line of a CSV file as raw string fields, header included.
pub fn read_fields(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> CsvWriterConfig {
        CsvWriterConfig::new(dir)
            .with_file_name("run")
            .with_columns(["name", "value"])
    }

    #[test]
    fn header_gets_unix_ms_column() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let writer = CsvWriter::create(&config(dir.path())).unwrap();
        let path = writer.close().unwrap();

        let rows = read_fields(&path).unwrap();
        assert_eq!(rows, vec![vec!["name", "value", "unix_ms"]]);
    }

    #[test]
    fn header_without_unix_time() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg = config(dir.path()).with_unix_time(false);
        let path = CsvWriter::create(&cfg).unwrap().close().unwrap();
        assert_eq!(read_fields(&path).unwrap(), vec![vec!["name", "value"]]);
    }

    #[test]
    fn no_header_when_columns_empty() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg = CsvWriterConfig::new(dir.path()).with_file_name("bare");
        let path = CsvWriter::create(&cfg).unwrap().close().unwrap();
        assert!(read_fields(&path).unwrap().is_empty());
    }

    #[test]
    fn write_line_commits_payload_and_unix_time() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut writer = CsvWriter::create(&config(dir.path())).unwrap();
        let before = unix_millis();
        writer.push("alpha").push(42);
        assert_eq!(writer.pending_fields(), 2);
        assert!(writer.write_line().unwrap());
        assert_eq!(writer.pending_fields(), 0);
        assert_eq!(writer.rows_written(), 1);
        let path = writer.close().unwrap();

        let rows = read_fields(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "alpha");
        assert_eq!(rows[1][1], "42");
        let stamp: i64 = rows[1][2].parse().unwrap();
        assert!(stamp >= before);
    }

    #[test]
    fn empty_payload_writes_nothing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut writer = CsvWriter::create(&config(dir.path())).unwrap();
        assert!(!writer.write_line().unwrap());
        assert_eq!(writer.rows_written(), 0);
    }

    #[test]
    fn vectors_expand_to_components() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg = CsvWriterConfig::new(dir.path())
            .with_file_name("vec")
            .with_unix_time(false);
        let mut writer = CsvWriter::create(&cfg).unwrap();
        writer
            .push_vec3(Vec3::new(1.0, -2.5, 3.0))
            .push_quaternion(Quaternion::identity());
        writer.write_line().unwrap();
        let path = writer.close().unwrap();

        let rows = read_fields(&path).unwrap();
        assert_eq!(rows[0], vec!["1", "-2.5", "3", "1", "0", "0", "0"]);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut writer = CsvWriter::create(&config(dir.path())).unwrap();
        writer.write_fields(["left, arm", "1"]).unwrap();
        let path = writer.close().unwrap();
        let rows = read_fields(&path).unwrap();
        assert_eq!(rows[1], vec!["left, arm", "1"]);
    }

    #[test]
    fn second_writer_gets_numbered_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let a = CsvWriter::create(&config(dir.path())).unwrap();
        let b = CsvWriter::create(&config(dir.path())).unwrap();
        assert!(a.path().ends_with("run.csv"));
        assert!(b.path().ends_with("run_1.csv"));
    }

    #[test]
    fn unnamed_writer_uses_timestamp_stem() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let cfg = CsvWriterConfig::new(dir.path().join("nested"));
        let writer = CsvWriter::create(&cfg).unwrap();
        let name = writer.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".csv"));
        assert_eq!(name.matches('-').count(), 2);
    }

    #[derive(Serialize)]
    struct Row {
        frame: u32,
        label: String,
    }

    #[test]
    fn save_records_uses_field_names_as_header() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let rows = vec![
            Row { frame: 1, label: "a".to_string() },
            Row { frame: 2, label: "b".to_string() },
        ];
        let path = save_records(&dir.path().join("table"), &rows).unwrap();
        assert!(path.ends_with("table.csv"));
        let fields = read_fields(&path).unwrap();
        assert_eq!(fields[0], vec!["frame", "label"]);
        assert_eq!(fields[2], vec!["2", "b"]);
    }

    #[test]
    fn save_records_does_not_clobber_dotted_sibling() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let sibling = dir.path().join("run.csv");
        fs::write(&sibling, "keep\n").unwrap();
        let rows = vec![Row { frame: 1, label: "a".to_string() }];
        let path = save_records(&dir.path().join("run.v2"), &rows).unwrap();
        assert!(path.ends_with("run.v2.csv"));
        assert_eq!(fs::read_to_string(&sibling).unwrap(), "keep\n");
    }
}
