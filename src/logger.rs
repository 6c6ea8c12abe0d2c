use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::{Config, LoggingConfig};
use crate::constants::{LOG_FILE_NAME, MAX_IN_MEMORY_LOG_LINES};

type FileWriter = Arc<Mutex<BufWriter<File>>>;

/// Shared logger that can be used across the application
///
/// Keeps the most recent lines in memory (for a debug view) and, when file
/// logging is enabled, appends every line to the log file as well.
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<VecDeque<String>>>,
    file_writer: Option<FileWriter>,
    enabled: bool,
}

impl Logger {
    /// In-memory logger without a file writer
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(VecDeque::new())),
            file_writer: None,
            enabled: false,
        }
    }

    /// Build a logger from the `logging.enabled` setting
    pub fn from_config(enabled: bool) -> Result<Self> {
        if enabled {
            Self::with_file(&Self::get_log_file_path()?)
        } else {
            Ok(Self::new())
        }
    }

    /// Logger that also appends to the file at `path`
    pub fn with_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        Ok(Self {
            logs: Arc::new(Mutex::new(VecDeque::new())),
            file_writer: Some(Arc::new(Mutex::new(BufWriter::new(file)))),
            enabled: true,
        })
    }

    /// Add a log entry
    pub fn log(&self, message: String) {
        let timestamp = Utc::now().format("%H:%M:%S%.3f").to_string();
        let formatted_message = format!("[{}] {}", timestamp, message);

        if let Some(writer) = &self.file_writer {
            if let Ok(mut writer) = writer.lock() {
                let _ = writeln!(writer, "{}", formatted_message);
                let _ = writer.flush();
            }
        }

        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() == MAX_IN_MEMORY_LOG_LINES {
                logs.pop_front();
            }
            logs.push_back(formatted_message);
        }
    }

    /// Get all logs sorted by date (newest first)
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            logs.iter().rev().cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// Clear all in-memory logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_file_writer(&self) -> bool {
        self.file_writer.is_some()
    }

    pub fn file_writer(&self) -> Option<FileWriter> {
        self.file_writer.clone()
    }

    /// Path of the log file in the data directory
    pub fn get_log_file_path() -> Result<PathBuf> {
        Ok(Config::get_data_dir()?.join(LOG_FILE_NAME))
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Route the `log` macros into `logger` at the configured level.
///
/// Can only succeed once per process.
pub fn init_logging(config: &LoggingConfig, logger: &Logger) -> Result<()> {
    let level = config.level_filter()?;
    let sink = logger.clone();

    fern::Dispatch::new()
        .level(level)
        .level_for("sqlx", log::LevelFilter::Warn)
        .level_for("sea_orm", log::LevelFilter::Warn)
        .chain(fern::Output::call(move |record| {
            sink.log(format!("{:<5} {}: {}", record.level(), record.target(), record.args()));
        }))
        .apply()
        .context("Failed to install logger")?;

    Ok(())
}
