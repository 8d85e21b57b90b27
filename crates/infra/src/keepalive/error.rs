//! Keep-alive agent error types

use chronoboard_domain::ChronoBoardError;
use thiserror::Error;

/// Agent lifecycle errors
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent is already running
    #[error("Keep-alive agent already running")]
    AlreadyRunning,

    /// Agent is not running
    #[error("Keep-alive agent not running")]
    NotRunning,

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<AgentError> for ChronoBoardError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::AlreadyRunning | AgentError::NotRunning => {
                ChronoBoardError::InvalidInput(err.to_string())
            }
            _ => ChronoBoardError::Internal(err.to_string()),
        }
    }
}

/// Convenience type alias for agent lifecycle operations
pub type AgentResult<T> = Result<T, AgentError>;
