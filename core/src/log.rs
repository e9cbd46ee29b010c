//! Log level and destination settings shared by the CLI and runtime.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log file name written under [`LogConfig::log_dir`].
pub const LOG_FILE_NAME: &str = "tagkeep.log";

/// Verbosity accepted on the command line.
///
/// `NotSet` disables the destination entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Critical,
    NotSet,
}

impl LogLevel {
    /// The matching `tracing` level, or `None` when disabled.
    pub fn as_tracing(self) -> Option<tracing::Level> {
        match self {
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warning => Some(tracing::Level::WARN),
            LogLevel::Critical => Some(tracing::Level::ERROR),
            LogLevel::NotSet => None,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != LogLevel::NotSet
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
            Self::NotSet => write!(f, "notset"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "critical" | "error" => Ok(Self::Critical),
            "notset" => Ok(Self::NotSet),
            _ => Err(format!(
                "unknown log level: '{}' (supported: debug, info, warning, critical, notset)",
                s
            )),
        }
    }
}

/// Where log records go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub console_level: LogLevel,
    pub file_level: LogLevel,
    /// Directory holding the log file
    pub log_dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LogLevel::Info,
            file_level: LogLevel::NotSet,
            log_dir: PathBuf::from("."),
        }
    }
}

impl LogConfig {
    /// Path of the log file; only meaningful when file logging is enabled.
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}
