//! Logging system configuration and initialization
//!
//! Console and/or file output through `tracing-subscriber`, plain text or
//! JSON, with local-time timestamps. A previous log file is rotated to a
//! timestamped name on startup and only the newest `max_files` are kept.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

/// Active log file name inside the log directory
pub const LOG_FILE_NAME: &str = "swatch-scraper.log";

/// Dependencies that are only interesting at trace level
const QUIET_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "html5ever", "selectors", "cookie_store"];

// Keeps the non-blocking file writer alive for the whole process
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Timestamps in the machine's local time zone
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` takes precedence over `config.level`:
/// ```bash
/// RUST_LOG="debug,reqwest=debug" swatch-scraper run
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.console_output && !config.file_output {
        return Err(anyhow!("No logging output configured"));
    }

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        layers.push(console_layer(config.json_format));
    }

    if config.file_output {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", config.log_dir))?;
        rotate_existing_log_file(&config.log_dir, LOG_FILE_NAME)?;
        cleanup_old_logs(&config.log_dir, config.max_files)?;

        let (file_writer, file_guard) = non_blocking(rolling::never(&config.log_dir, LOG_FILE_NAME));
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(file_guard);
        layers.push(file_layer(file_writer, config.json_format));
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_env_filter(&config.level)?,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log file: {:?}", config.log_dir.join(LOG_FILE_NAME));
    }

    Ok(())
}

/// Filter for the configured level, quieting noisy dependencies below trace
pub fn build_env_filter(level: &str) -> Result<EnvFilter> {
    let mut directives = level.to_string();
    if !level.to_lowercase().contains("trace") {
        for target in QUIET_TARGETS {
            directives.push_str(&format!(",{}=warn", target));
        }
    }

    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log level: {}", level))
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        fmt::Layer::new()
            .json()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .boxed()
    } else {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .boxed()
    }
}

fn file_layer(writer: NonBlocking, json: bool) -> BoxedLayer {
    if json {
        fmt::Layer::new()
            .json()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::Layer::new()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .with_ansi(false)
            .boxed()
    }
}

/// Rename an existing log file to `<stem>.<timestamp>.log`
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<Option<PathBuf>> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&log_file_path).context("Failed to get log file metadata")?;
    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let local_time: DateTime<Local> = file_time.into();

    let file_stem = log_file_name.trim_end_matches(".log");
    let timestamped_path = log_dir.join(format!("{}.{}.log", file_stem, local_time.format("%Y%m%dT%H%M%S%.3f")));

    std::fs::rename(&log_file_path, &timestamped_path).with_context(|| {
        format!(
            "Failed to rotate log file {} to {}",
            log_file_path.display(),
            timestamped_path.display()
        )
    })?;

    Ok(Some(timestamped_path))
}

/// Delete all but the newest `max_files` log files
fn cleanup_old_logs(log_dir: &Path, max_files: usize) -> Result<usize> {
    let mut log_files = Vec::new();

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.extension().is_some_and(|ext| ext == "log");
        if path.is_file() && is_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(max_files) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }

    Ok(removed)
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("Swatch Scraper {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}
