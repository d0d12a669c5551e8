//! File-name helpers shared by the recorders.
//!
//! Recorders never overwrite an earlier dump: a requested name that is taken
//! gets a numeric suffix instead (`run.csv`, `run_1.csv`, `run_2.csv`, …).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Local wall-clock time as `HH-MM-SS`, the default stem for unnamed dumps.
pub fn timestamp_stem() -> String {
    Local::now().format("%H-%M-%S").to_string()
}

/// Pick a file name in `dir` that does not exist yet.
///
/// The first candidate is `stem.ext`, or `stem_0.ext` when `append_zero` is
/// set; after that `stem_1.ext`, `stem_2.ext`, … are tried in order.
pub fn unique_file_path(dir: &Path, stem: &str, ext: &str, append_zero: bool) -> PathBuf {
    let first = if append_zero {
        dir.join(format!("{stem}_0.{ext}"))
    } else {
        dir.join(format!("{stem}.{ext}"))
    };
    if !first.exists() {
        return first;
    }
    (1u64..)
        .map(|n| dir.join(format!("{stem}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// `path` itself if free, otherwise `path_1`, `path_2`, …
pub fn unique_dir(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let base = path.as_os_str().to_string_lossy().into_owned();
    (1u64..)
        .map(|n| PathBuf::from(format!("{base}_{n}")))
        .find(|p| !p.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// `path` with `.ext` appended unless it already ends in `.ext`.
///
/// Unlike [`Path::with_extension`] this never drops part of the name, so
/// `run.v2` becomes `run.v2.json` rather than `run.json`.
pub fn with_ext_appended(path: &Path, ext: &str) -> PathBuf {
    let has_ext = path
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext));
    if has_ext {
        return path.to_path_buf();
    }
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Create a fresh directory next to `path` (see [`unique_dir`]) and return it.
pub fn create_unique_dir(path: &Path) -> io::Result<PathBuf> {
    let dir = unique_dir(path);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
