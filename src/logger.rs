//! File-based logging using simplelog
//!
//! The terminal belongs to the UI, so log output goes to a timestamped file
//! in the cache directory (`~/.cache/logsift/` on Linux).

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("logsift"))
        .unwrap_or_else(std::env::temp_dir)
}

fn level_from_env() -> LevelFilter {
    std::env::var("RUST_LOG")
        .map(|v| match v.to_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        })
        .unwrap_or(LevelFilter::Info)
}

/// Initialize file-based logging. Returns the path of the log file.
pub fn init() -> Result<PathBuf> {
    let dir = log_dir();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let log_file = dir.join(format!("logsift-{}.log", timestamp));

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c)
        .build();

    let file = File::create(&log_file)
        .with_context(|| format!("creating log file {}", log_file.display()))?;
    WriteLogger::init(level_from_env(), config, file).context("initializing logger")?;

    Ok(log_file)
}
