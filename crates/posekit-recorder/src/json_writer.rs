//! Pretty-printed JSON snapshots.
//!
//! A [`JsonWriter`] owns one target file inside a session directory.  Without
//! an explicit directory name the session directory is named after the
//! current local time (`base/HH-MM-SS`).  After [`JsonWriter::disable`] every
//! save or load fails with [`RecorderError::Inactive`].
//!
//! # Example
//!
//! ```rust
//! use posekit_recorder::json_writer::{JsonWriter, JsonWriterConfig};
//! use posekit_types::Vec3;
//!
//! let base = tempfile::tempdir().unwrap();
//! let config = JsonWriterConfig::new(base.path())
//!     .with_dir_name("session")
//!     .with_file_name("origin");
//! let writer = JsonWriter::create(&config).unwrap();
//!
//! writer.save(&Vec3::new(1.0, 2.0, 3.0)).unwrap();
//! let back: Option<Vec3> = writer.load().unwrap();
//! assert_eq!(back, Some(Vec3::new(1.0, 2.0, 3.0)));
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{RecorderError, Result};
use crate::paths::{timestamp_stem, unique_file_path, with_ext_appended};

/// Where a [`JsonWriter`] places its file.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonWriterConfig {
    pub base_dir: PathBuf,
    /// Session sub-directory; `None` or empty uses `HH-MM-SS`.
    pub dir_name: Option<String>,
    /// File stem; `None` or empty uses `HH-MM-SS`.
    pub file_name: Option<String>,
    pub append_zero_to_filename: bool,
}

impl JsonWriterConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            dir_name: None,
            file_name: None,
            append_zero_to_filename: false,
        }
    }

    pub fn with_dir_name(mut self, name: impl Into<String>) -> Self {
        self.dir_name = Some(name.into());
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

pub struct JsonWriter {
    path: PathBuf,
    active: bool,
}

impl JsonWriter {
    /// Create the session directory and reserve a unique `.json` file name.
    pub fn create(config: &JsonWriterConfig) -> Result<Self> {
        let dir = match non_empty(config.dir_name.as_deref()) {
            Some(name) => config.base_dir.join(name),
            None => config.base_dir.join(timestamp_stem()),
        };
        fs::create_dir_all(&dir)?;

        let stem = non_empty(config.file_name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(timestamp_stem);
        let path = unique_file_path(&dir, &stem, "json", config.append_zero_to_filename);
        debug!(path = %path.display(), "JSON writer ready");

        Ok(Self { path, active: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn disable(&mut self) {
        self.active = false;
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(RecorderError::Inactive)
        }
    }

    /// Serialize `data` as pretty JSON, replacing the file's contents.
    pub fn save<T: Serialize + ?Sized>(&self, data: &T) -> Result<()> {
        self.save_str(&to_json(data)?)
    }

    /// Write an already-encoded JSON document.
    pub fn save_str(&self, json: &str) -> Result<()> {
        self.ensure_active()?;
        fs::write(&self.path, json)?;
        info!(path = %self.path.display(), bytes = json.len(), "JSON saved");
        Ok(())
    }

    /// Read the file back.  `Ok(None)` when nothing has been saved yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.ensure_active()?;
        load_json(&self.path)
    }
}

/// Pretty-printed JSON encoding of `data`.
pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Write `data` to `path`, appending `.json` when it is missing.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<PathBuf> {
    let path = with_ext_appended(path, "json");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, to_json(data)?)?;
    Ok(path)
}

/// Read `path` (`.json` appended when missing); `Ok(None)` if there is no
/// such file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let path = with_ext_appended(path, "json");
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)?;
    from_json(&raw).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use posekit_types::{Pose, Quaternion, Vec3};

    #[test]
    fn load_before_save_returns_none() {
        let base = tempfile::tempdir().expect("tmp dir");
        let writer = JsonWriter::create(&JsonWriterConfig::new(base.path()).with_file_name("a")).unwrap();
        let loaded: Option<Pose> = writer.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn save_then_load_pose() {
        let base = tempfile::tempdir().expect("tmp dir");
        let cfg = JsonWriterConfig::new(base.path())
            .with_dir_name("poses")
            .with_file_name("start");
        let writer = JsonWriter::create(&cfg).unwrap();
        assert!(writer.path().ends_with("poses/start.json"));

        let pose = Pose::new(Vec3::new(1.0, 0.5, -2.0), Quaternion::new(0.0, 1.0, 0.0, 0.0));
        writer.save(&pose).unwrap();
        let back: Pose = writer.load().unwrap().unwrap();
        assert_eq!(back, pose);

        let raw = fs::read_to_string(writer.path()).unwrap();
        assert!(raw.contains('\n'), "output should be pretty-printed");
    }

    #[test]
    fn default_dir_is_timestamped() {
        let base = tempfile::tempdir().expect("tmp dir");
        let writer = JsonWriter::create(&JsonWriterConfig::new(base.path())).unwrap();
        let dir = writer.path().parent().unwrap();
        assert_eq!(dir.parent().unwrap(), base.path());
        let dir_name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(dir_name.matches('-').count(), 2);
    }

    #[test]
    fn disabled_writer_refuses_io() {
        let base = tempfile::tempdir().expect("tmp dir");
        let mut writer = JsonWriter::create(&JsonWriterConfig::new(base.path()).with_file_name("x")).unwrap();
        writer.disable();
        assert!(!writer.is_active());
        assert!(matches!(writer.save(&1u8), Err(RecorderError::Inactive)));
        assert!(matches!(writer.load::<u8>(), Err(RecorderError::Inactive)));
        assert!(!writer.path().exists());
    }

    #[test]
    fn free_helpers_append_json_extension() {
        let base = tempfile::tempdir().expect("tmp dir");
        let path = save_json(&base.path().join("out/data"), &vec![1, 2, 3]).unwrap();
        assert!(path.ends_with("out/data.json"));
        let back: Option<Vec<i32>> = load_json(&base.path().join("out/data")).unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn save_json_keeps_dotted_stem() {
        let base = tempfile::tempdir().expect("tmp dir");
        let sibling = base.path().join("run.json");
        fs::write(&sibling, "[0]").unwrap();
        let path = save_json(&base.path().join("run.v2"), &vec![1]).unwrap();
        assert!(path.ends_with("run.v2.json"));
        assert_eq!(fs::read_to_string(&sibling).unwrap(), "[0]");
        let back: Option<Vec<i32>> = load_json(&base.path().join("run.v2")).unwrap();
        assert_eq!(back, Some(vec![1]));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(from_json::<Vec3>("{not json"), Err(RecorderError::Json(_))));
    }
}
