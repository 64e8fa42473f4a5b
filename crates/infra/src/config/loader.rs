//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SLOTLINE_DB_PATH`: Database file path (required for env loading)
//! - `SLOTLINE_DB_POOL_SIZE`: Connection pool size
//! - `SLOTLINE_TIMEZONE`: IANA timezone of the business calendar
//! - `SLOTLINE_WORK_START_HOUR` / `SLOTLINE_WORK_END_HOUR`: working window
//! - `SLOTLINE_GRID_STEP_MIN`: slot grid granularity in minutes
//! - `SLOTLINE_LOCK_TIMEOUT_MIN`: pending booking soft-lock in minutes
//! - `SLOTLINE_DAYS_AHEAD`: availability horizon in days
//! - `SLOTLINE_SWEEP_CRON`: cron expression of the nightly sweep
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `slotline.{json,toml}` in the
//! working directory, its parents (two levels), and next to the executable.

use std::path::{Path, PathBuf};

use slotline_domain::{Config, Result, SlotlineError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `SLOTLINE_DB_PATH` must be present; every other variable falls back to
/// its default.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.database.path = env_var("SLOTLINE_DB_PATH")?;
    if let Some(pool_size) = env_parse::<u32>("SLOTLINE_DB_POOL_SIZE")? {
        config.database.pool_size = pool_size;
    }

    if let Ok(timezone) = std::env::var("SLOTLINE_TIMEZONE") {
        config.scheduling.timezone = timezone;
    }
    if let Some(hour) = env_parse::<u32>("SLOTLINE_WORK_START_HOUR")? {
        config.scheduling.work_start_hour = hour;
    }
    if let Some(hour) = env_parse::<u32>("SLOTLINE_WORK_END_HOUR")? {
        config.scheduling.work_end_hour = hour;
    }
    if let Some(step) = env_parse::<i64>("SLOTLINE_GRID_STEP_MIN")? {
        config.scheduling.grid_step_min = step;
    }
    if let Some(timeout) = env_parse::<i64>("SLOTLINE_LOCK_TIMEOUT_MIN")? {
        config.scheduling.lock_timeout_min = timeout;
    }
    if let Some(days) = env_parse::<u32>("SLOTLINE_DAYS_AHEAD")? {
        config.scheduling.days_ahead = days;
    }
    if let Ok(cron) = std::env::var("SLOTLINE_SWEEP_CRON") {
        config.dispatch.sweep_cron = cron;
    }

    config.scheduling.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SlotlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SlotlineError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SlotlineError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.scheduling.validate()?;
    Ok(config)
}

/// Parse configuration from string content, detecting the format by file
/// extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SlotlineError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SlotlineError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SlotlineError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe standard locations for a configuration file, returning the first
/// one that exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in [&cwd, &cwd.join(".."), &cwd.join("../..")] {
            candidates.push(base.join("config.json"));
            candidates.push(base.join("config.toml"));
            candidates.push(base.join("slotline.json"));
            candidates.push(base.join("slotline.toml"));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("config.json"));
            candidates.push(exe_dir.join("config.toml"));
            candidates.push(exe_dir.join("slotline.json"));
            candidates.push(exe_dir.join("slotline.toml"));
        }
    }

    candidates.into_iter().find(|p| p.exists())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| SlotlineError::Config(format!("Missing environment variable: {name}")))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| SlotlineError::Config(format!("Invalid value for {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
