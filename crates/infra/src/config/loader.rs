//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. If no configuration is found anywhere, uses built-in defaults
//!
//! ## Environment Variables
//! - `CHRONOBOARD_DB_PATH`: Database file path (marker that env config is in
//!   use)
//! - `CHRONOBOARD_DB_POOL_SIZE`: Connection pool size
//! - `CHRONOBOARD_HEARTBEAT_INTERVAL`: Heartbeat period in seconds
//! - `CHRONOBOARD_STALE_AFTER`: Staleness threshold in seconds
//! - `CHRONOBOARD_TICK_INTERVAL_MS`: Elapsed-time tick period in milliseconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` or `./config.json` (current working directory)
//! 2. `./chronoboard.toml` or `./chronoboard.json` (current working
//!    directory)
//! 3. The same names in the parent directory

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chronoboard_domain::constants::{
    DEFAULT_DB_POOL_SIZE, ELAPSED_TICK_INTERVAL_MS, HEARTBEAT_INTERVAL_SECS,
    STALE_TIMER_AFTER_SECS,
};
use chronoboard_domain::{ChronoBoardError, Config, DatabaseConfig, Result, TimerConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables, then from a probed
/// config file, then falls back to defaults.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(&path),
                None => {
                    tracing::info!("No configuration found; using defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `CHRONOBOARD_DB_PATH` must be present; the remaining variables fall back
/// to their defaults when unset.
///
/// # Errors
/// Returns `ChronoBoardError::Config` if the database path is missing or any
/// present variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = std::env::var("CHRONOBOARD_DB_PATH")
        .map_err(|_| ChronoBoardError::Config("CHRONOBOARD_DB_PATH not set".into()))?;
    let pool_size = env_parse("CHRONOBOARD_DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE)?;
    let heartbeat_interval_secs =
        env_parse("CHRONOBOARD_HEARTBEAT_INTERVAL", HEARTBEAT_INTERVAL_SECS)?;
    let stale_after_secs = env_parse("CHRONOBOARD_STALE_AFTER", STALE_TIMER_AFTER_SECS)?;
    let tick_interval_ms = env_parse("CHRONOBOARD_TICK_INTERVAL_MS", ELAPSED_TICK_INTERVAL_MS)?;

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        timer: TimerConfig { heartbeat_interval_secs, stale_after_secs, tick_interval_ms },
    })
}

/// Load configuration from a file
///
/// Supports both TOML and JSON formats (detected by file extension).
///
/// # Errors
/// Returns `ChronoBoardError::Config` if the file cannot be read or parsed.
pub fn load_from_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|err| {
        ChronoBoardError::Config(format!("cannot read {}: {err}", path.display()))
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&contents)
            .map_err(|err| ChronoBoardError::Config(format!("invalid TOML config: {err}")))?,
        Some("json") => serde_json::from_str(&contents)
            .map_err(|err| ChronoBoardError::Config(format!("invalid JSON config: {err}")))?,
        _ => {
            return Err(ChronoBoardError::Config(format!(
                "unsupported config format: {}",
                path.display()
            )))
        }
    };

    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.toml", "config.json", "chronoboard.toml", "chronoboard.json"];

    for dir in [".", ".."] {
        for name in NAMES {
            let candidate = Path::new(dir).join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| ChronoBoardError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn loads_toml_config_file() {
        let temp_dir = TempDir::new().expect("tempdir created");
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[database]
path = "custom.db"
pool_size = 2

[timer]
heartbeat_interval_secs = 15
stale_after_secs = 120
tick_interval_ms = 500
"#,
        )
        .expect("config written");

        let config = load_from_file(&path).expect("config parsed");
        assert_eq!(config.database.path, "custom.db");
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.timer.heartbeat_interval_secs, 15);
    }

    #[test]
    fn loads_json_config_file_with_section_defaults() {
        let temp_dir = TempDir::new().expect("tempdir created");
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"database": {"path": "board.db", "pool_size": 8}}"#)
            .expect("config written");

        let config = load_from_file(&path).expect("config parsed");
        assert_eq!(config.database.path, "board.db");
        assert_eq!(config.timer.heartbeat_interval_secs, HEARTBEAT_INTERVAL_SECS);
    }

    #[test]
    fn rejects_unknown_extension() {
        let temp_dir = TempDir::new().expect("tempdir created");
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "database: {}").expect("config written");

        let err = load_from_file(&path).expect_err("yaml is unsupported");
        assert!(matches!(err, ChronoBoardError::Config(_)));
    }

    #[test]
    fn rejects_invalid_toml() {
        let temp_dir = TempDir::new().expect("tempdir created");
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "not valid [toml").expect("config written");

        let err = load_from_file(&path).expect_err("parse must fail");
        assert!(matches!(err, ChronoBoardError::Config(_)));
    }
}
