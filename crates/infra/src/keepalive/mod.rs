//! Background keep-alive agent
//!
//! Runs independently of any foreground page, refreshing the active timer's
//! heartbeat and relaying timer lifecycle messages between pages.

pub mod agent;
pub mod error;

pub use agent::{KeepAliveAgent, KeepAliveConfig};
pub use error::{AgentError, AgentResult};
