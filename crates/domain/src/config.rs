//! Application configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE, ELAPSED_TICK_INTERVAL_MS, HEARTBEAT_INTERVAL_SECS,
    STALE_TIMER_AFTER_SECS,
};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Timer core settings
///
/// `stale_after_secs` should stay a generous multiple of
/// `heartbeat_interval_secs` so a single missed heartbeat never reconciles a
/// live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    pub heartbeat_interval_secs: u64,
    pub stale_after_secs: u64,
    pub tick_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: HEARTBEAT_INTERVAL_SECS,
            stale_after_secs: STALE_TIMER_AFTER_SECS,
            tick_interval_ms: ELAPSED_TICK_INTERVAL_MS,
        }
    }
}
