//! Rolling File Logger
//!
//! Installs a `tracing` subscriber that writes to `{app}.log` inside a log
//! directory. When the file grows past its size limit it is rotated to
//! `{app}.log.1`, older files shift up, and the oldest is dropped. The most
//! recent lines are also kept in a circular buffer so a front-end can show
//! them without reading the file back.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::Local;
use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

/// Size at which the active log file is rotated
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
/// Number of rotated files kept next to the active one
pub const DEFAULT_MAX_FILES: usize = 5;
/// Lines kept in the in-memory circular buffer
pub const DEFAULT_BUFFER_LINES: usize = 200;

static LOGGER: OnceLock<SharedLog> = OnceLock::new();

/// Logger setup and usage errors
#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized,
    NotInitialized,
    Subscriber(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::Io(err) => write!(f, "Log file error: {}", err),
            LoggerError::AlreadyInitialized => write!(f, "Logger already initialized"),
            LoggerError::NotInitialized => write!(f, "Logger not initialized"),
            LoggerError::Subscriber(msg) => write!(f, "Failed to install subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LoggerError {
    fn from(err: io::Error) -> Self {
        LoggerError::Io(err)
    }
}

// ========================
// Rolling file
// ========================

/// A size-rotated log file plus a ring buffer of its latest lines
pub struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    max_files: usize,
    file: File,
    written: u64,
    recent: VecDeque<String>,
    capacity: usize,
    /// Bytes received without a trailing newline yet
    partial: String,
}

impl RollingFile {
    /// Open `{dir}/{app_name}.log` with the default limits
    pub fn open(dir: &Path, app_name: &str) -> io::Result<Self> {
        Self::with_limits(dir, app_name, DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES, DEFAULT_BUFFER_LINES)
    }

    pub fn with_limits(
        dir: &Path,
        app_name: &str,
        max_bytes: u64,
        max_files: usize,
        capacity: usize,
    ) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_bytes,
            max_files,
            file,
            written,
            recent: VecDeque::with_capacity(capacity),
            capacity,
            partial: String::new(),
        })
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.app_name))
    }

    /// Path of the `index`-th rotated file (1 = most recent)
    pub fn rotated_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.app_name, index))
    }

    /// Append one line, rotating first if it would overflow the size limit
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;
        if self.written > 0 && self.written + len > self.max_bytes {
            self.rotate()?;
        }

        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += len;

        if self.capacity > 0 {
            if self.recent.len() == self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }
        Ok(())
    }

    /// Latest lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.recent.iter().cloned().collect()
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let current = self.current_path();

        if self.max_files == 0 {
            fs::remove_file(&current)?;
        } else {
            let oldest = self.rotated_path(self.max_files);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.max_files).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            fs::rename(&current, self.rotated_path(1))?;
        }

        self.file = OpenOptions::new().create(true).append(true).open(&current)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.write_line(line.trim_end_matches(&['\n', '\r'][..]))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

// ========================
// Subscriber plumbing
// ========================

/// Rolling file shared between the subscriber and the helper functions
#[derive(Clone)]
pub struct SharedLog(Arc<Mutex<RollingFile>>);

impl SharedLog {
    pub fn new(file: RollingFile) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }

    pub fn recent_lines(&self) -> Vec<String> {
        self.0
            .lock()
            .map(|file| file.recent_lines())
            .unwrap_or_default()
    }
}

pub struct SharedLogWriter(Arc<Mutex<RollingFile>>);

impl Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?
            .flush()
    }
}

impl<'a> MakeWriter<'a> for SharedLog {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(self.0.clone())
    }
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ========================
// Public API
// ========================

/// Initialize the global logger at INFO level
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with_level(log_dir, app_name, Level::INFO)
}

pub fn init_logger_with_level(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    level: Level,
) -> Result<(), LoggerError> {
    let file = RollingFile::open(log_dir.as_ref(), app_name)?;
    let shared = SharedLog::new(file);
    LOGGER
        .set(shared.clone())
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    tracing_subscriber::fmt()
        .with_writer(shared)
        .with_ansi(false)
        .with_timer(LocalTimestamp)
        .with_max_level(level)
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))
}

fn logger() -> Result<&'static SharedLog, LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    logger()?;
    tracing::info!(target: "rolling_logger", "{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    logger()?;
    tracing::error!(target: "rolling_logger", "{}", message);
    Ok(())
}

/// Latest lines written by the global logger (empty before init)
pub fn recent_lines() -> Vec<String> {
    LOGGER.get().map(SharedLog::recent_lines).unwrap_or_default()
}
