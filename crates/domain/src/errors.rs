//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ChronoBoard
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ChronoBoardError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("State inconsistency: {0}")]
    StateInconsistency(String),

    #[error("Message delivery failed: {0}")]
    MessageDelivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for ChronoBoard operations
pub type Result<T> = std::result::Result<T, ChronoBoardError>;
