//! Plain-text session log with an in-memory tail.
//!
//! [`LogWriter`] appends every message to `log.txt` inside its directory and
//! keeps the last `max_chars` characters of the session in memory so a status
//! line can show recent output without re-reading the file.
//!
//! It also implements [`MakeWriter`], so it can be plugged straight into a
//! `tracing_subscriber::fmt` layer:
//!
//! ```rust,no_run
//! use posekit_recorder::LogWriter;
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let log = LogWriter::create("./posekit-data/logs", 700).unwrap();
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(log.clone()))
//!     .init();
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use crate::paths::unique_file_path;

pub const DEFAULT_TAIL_CHARS: usize = 700;
const TAIL_SEED: &str = "*begin log";

struct LogState {
    path: PathBuf,
    tail: String,
    max_chars: usize,
}

impl LogState {
    fn push_tail(&mut self, msg: &str) {
        self.tail.push(' ');
        self.tail.push_str(msg);
        let len = self.tail.chars().count();
        if len > self.max_chars {
            let cut = self
                .tail
                .char_indices()
                .nth(len - self.max_chars)
                .map_or(self.tail.len(), |(i, _)| i);
            self.tail.drain(..cut);
        }
    }
}

/// Cloneable handle to one session log file.
#[derive(Clone)]
pub struct LogWriter {
    state: Arc<Mutex<LogState>>,
}

impl LogWriter {
    /// Create `dir` if needed and reserve a fresh `log.txt` inside it.
    pub fn create(dir: impl AsRef<Path>, max_chars: usize) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = unique_file_path(dir, "log", "txt", false);
        fs::write(&path, "")?;
        Ok(Self {
            state: Arc::new(Mutex::new(LogState {
                path,
                tail: TAIL_SEED.to_string(),
                max_chars: max_chars.max(1),
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `msg` as one line.  Write failures are dropped; the tail is
    /// still updated.
    pub fn log(&self, msg: &str) {
        let mut state = self.lock();
        if let Ok(mut file) = OpenOptions::new().append(true).create(true).open(&state.path) {
            let _ = writeln!(file, "{msg}");
        }
        state.push_tail(msg);
    }

    /// The most recent output, at most `max_chars` characters.
    pub fn tail(&self) -> String {
        self.lock().tail.clone()
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }
}

/// Buffers one formatted `tracing` event and logs it on drop.
pub struct LogLine {
    sink: LogWriter,
    buf: Vec<u8>,
}

impl Write for LogLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LogLine {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.sink.log(line);
        }
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogLine;

    fn make_writer(&'a self) -> Self::Writer {
        LogLine {
            sink: self.clone(),
            buf: Vec::new(),
        }
    }
}
