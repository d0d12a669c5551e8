//! Configuration Vault – reads/writes `~/.posekit/config.toml`.

use posekit_motion::{EstimatorConfig, UpdateMode};
use posekit_recorder::CsvWriterConfig;
use posekit_types::{STANDARD_GRAVITY, Vec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user configuration stored in `~/.posekit/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Gravity vector in world coordinates (m/s²); Y is up.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],

    /// `fixed` uses `fixed_dt` every tick, `frame` uses measured timestamps.
    #[serde(default)]
    pub update_mode: UpdateMode,

    /// Simulation step in seconds.
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f32,

    /// Write IMU logs while running.
    #[serde(default = "default_true")]
    pub record: bool,

    /// Directory receiving CSV / JSON / WAV output.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output file stem; empty means `HH-MM-SS`.
    #[serde(default)]
    pub file_name: String,

    #[serde(default = "default_true")]
    pub write_unix_time: bool,

    #[serde(default)]
    pub append_zero_to_filename: bool,

    /// Weight of the newest frame in the smoothed frame rate.
    #[serde(default = "default_fps_smoothing_ratio")]
    pub fps_smoothing_ratio: f32,

    /// Session log directory; empty disables the file log.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log_dir: String,

    /// Characters kept in the in-memory log tail.
    #[serde(default = "default_log_tail_chars")]
    pub log_tail_chars: usize,
}

fn default_gravity() -> [f32; 3] {
    [0.0, -STANDARD_GRAVITY, 0.0]
}
fn default_fixed_dt() -> f32 {
    0.02
}
fn default_true() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./posekit-data")
}
fn default_fps_smoothing_ratio() -> f32 {
    posekit_motion::frame_counter::DEFAULT_SMOOTHING_RATIO
}
fn default_log_tail_chars() -> usize {
    posekit_recorder::log_writer::DEFAULT_TAIL_CHARS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            update_mode: UpdateMode::default(),
            fixed_dt: default_fixed_dt(),
            record: true,
            output_dir: default_output_dir(),
            file_name: String::new(),
            write_unix_time: true,
            append_zero_to_filename: false,
            fps_smoothing_ratio: default_fps_smoothing_ratio(),
            log_dir: String::new(),
            log_tail_chars: default_log_tail_chars(),
        }
    }
}

impl Config {
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            gravity: Vec3::from(self.gravity),
        }
    }

    /// CSV writer settings for a log named `file_name` (or the configured
    /// name when `None`).
    pub fn csv_writer_config(&self, file_name: Option<&str>) -> CsvWriterConfig {
        let mut cfg = CsvWriterConfig::new(&self.output_dir)
            .with_unix_time(self.write_unix_time)
            .with_append_zero(self.append_zero_to_filename);
        let name = file_name.unwrap_or(&self.file_name);
        if !name.trim().is_empty() {
            cfg = cfg.with_file_name(name);
        }
        cfg
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        let dir = self.log_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }

    /// Reject values that would make every tick fail.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(format!("fixed_dt must be a positive number, got {}", self.fixed_dt));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err("gravity must be finite".to_string());
        }
        Ok(())
    }
}

/// Return the path to `~/.posekit/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".posekit").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Effective configuration: the file if present, defaults otherwise, with
/// environment overrides applied either way.
pub fn load_or_default() -> Result<Config, String> {
    let cfg = match load()? {
        Some(cfg) => cfg,
        None => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            cfg
        }
    };
    cfg.validate()?;
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `POSEKIT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `POSEKIT_OUTPUT_DIR` | `output_dir` |
/// | `POSEKIT_FIXED_DT` | `fixed_dt` |
/// | `POSEKIT_UPDATE_MODE` | `update_mode` |
/// | `POSEKIT_LOG_DIR` | `log_dir` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("POSEKIT_OUTPUT_DIR")
        && !v.trim().is_empty()
    {
        cfg.output_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("POSEKIT_FIXED_DT")
        && let Ok(dt) = v.parse::<f32>()
        && dt.is_finite()
        && dt > 0.0
    {
        cfg.fixed_dt = dt;
    }
    if let Ok(v) = std::env::var("POSEKIT_UPDATE_MODE")
        && let Ok(mode) = v.parse::<UpdateMode>()
    {
        cfg.update_mode = mode;
    }
    if let Ok(v) = std::env::var("POSEKIT_LOG_DIR") {
        cfg.log_dir = v;
    }
}

/// Save the config to disk, creating `~/.posekit/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-var tests share process state.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.gravity, [0.0, -9.81, 0.0]);
        assert_eq!(cfg.update_mode, UpdateMode::Fixed);
        assert!((cfg.fixed_dt - 0.02).abs() < 1e-6);
        assert!(cfg.record);
        assert!(cfg.write_unix_time);
        assert!(!cfg.append_zero_to_filename);
        assert!((cfg.fps_smoothing_ratio - 0.75).abs() < 1e-6);
        assert_eq!(cfg.log_tail_chars, 700);
        assert!(cfg.log_dir().is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "update_mode = \"frame\"\nfixed_dt = 0.01\n").unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.update_mode, UpdateMode::Frame);
        assert!((cfg.fixed_dt - 0.01).abs() < 1e-6);
        assert_eq!(cfg.gravity, [0.0, -9.81, 0.0]);
        assert_eq!(cfg.output_dir, PathBuf::from("./posekit-data"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "fixed_dt = \"fast\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }

    #[test]
    fn config_path_points_to_posekit_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.posekit/config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn validate_rejects_bad_step() {
        let mut cfg = Config::default();
        cfg.fixed_dt = 0.0;
        assert!(cfg.validate().is_err());
        cfg.fixed_dt = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn csv_writer_config_uses_name_override() {
        let mut cfg = Config::default();
        cfg.file_name = "session".into();
        assert_eq!(cfg.csv_writer_config(None).file_name.as_deref(), Some("session"));
        assert_eq!(cfg.csv_writer_config(Some("other")).file_name.as_deref(), Some("other"));
        cfg.file_name.clear();
        assert!(cfg.csv_writer_config(None).file_name.is_none());
    }

    // ── Environment overrides ────────────────────────────────────────────

    #[test]
    fn apply_env_overrides_changes_fields() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: env access is serialized by ENV_LOCK.
        unsafe {
            std::env::set_var("POSEKIT_OUTPUT_DIR", "/tmp/imu-out");
            std::env::set_var("POSEKIT_FIXED_DT", "0.005");
            std::env::set_var("POSEKIT_UPDATE_MODE", "frame");
            std::env::set_var("POSEKIT_LOG_DIR", "/tmp/imu-logs");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("POSEKIT_OUTPUT_DIR");
            std::env::remove_var("POSEKIT_FIXED_DT");
            std::env::remove_var("POSEKIT_UPDATE_MODE");
            std::env::remove_var("POSEKIT_LOG_DIR");
        }
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/imu-out"));
        assert!((cfg.fixed_dt - 0.005).abs() < 1e-6);
        assert_eq!(cfg.update_mode, UpdateMode::Frame);
        assert_eq!(cfg.log_dir(), Some(PathBuf::from("/tmp/imu-logs")));
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        // SAFETY: env access is serialized by ENV_LOCK.
        unsafe {
            std::env::set_var("POSEKIT_FIXED_DT", "-1");
            std::env::set_var("POSEKIT_UPDATE_MODE", "sometimes");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        unsafe {
            std::env::remove_var("POSEKIT_FIXED_DT");
            std::env::remove_var("POSEKIT_UPDATE_MODE");
        }
        assert!((cfg.fixed_dt - 0.02).abs() < 1e-6);
        assert_eq!(cfg.update_mode, UpdateMode::Fixed);
    }
}
