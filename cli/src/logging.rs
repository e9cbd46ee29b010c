//! Tracing subscriber setup: a console layer and an optional log file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tagkeep_core::{LogConfig, LogLevel};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// `EnvFilter` directive for a level.
pub fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warning => "warn",
        LogLevel::Critical => "error",
        LogLevel::NotSet => "off",
    }
}

/// Install the global subscriber.
///
/// The console shows bare messages unless running at debug, where level
/// and target are added. `RUST_LOG` overrides the console level when set.
pub fn init(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let console_filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env()?
    } else {
        EnvFilter::new(directive(config.console_level))
    };

    let verbose = config.console_level == LogLevel::Debug;
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_level(verbose)
        .with_target(verbose)
        .with_filter(console_filter);

    let file = match config.file_level.as_tracing() {
        Some(level) => {
            let path = config.log_file();
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(LevelFilter::from_level(level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;

    Ok(())
}
