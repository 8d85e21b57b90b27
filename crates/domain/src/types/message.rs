//! Cross-context timer message protocol
//!
//! Pages and the keep-alive agent communicate only through these messages;
//! there is no shared memory between contexts. The serde representation
//! matches the wire protocol (`{"type": "...", "payload": {...}}` with
//! camelCase payload keys), so the same types serve channel transport and
//! JSON interop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timer::TimerState;

/// Message sent from a foreground page to the keep-alive agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TimerCommand {
    /// Start (or adopt) a timer for `task_id` that began at `start_time`.
    #[serde(rename = "TIMER_START", rename_all = "camelCase")]
    Start { task_id: String, start_time: DateTime<Utc> },

    /// Stop the timer for `task_id`.
    #[serde(rename = "TIMER_STOP", rename_all = "camelCase")]
    Stop { task_id: String },

    /// Ask the agent to broadcast the current timer state.
    #[serde(rename = "TIMER_STATE_REQUEST")]
    StateRequest {},

    /// Any message type this build does not understand. Ignored with a
    /// warning, never fatal.
    #[serde(other, skip_serializing)]
    Unknown,
}

/// Notification broadcast from the agent to all connected pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TimerEvent {
    #[serde(rename = "TIMER_STARTED", rename_all = "camelCase")]
    Started { task_id: String },

    #[serde(rename = "TIMER_STOPPED", rename_all = "camelCase")]
    Stopped { task_id: String },

    /// Ground-truth state snapshot; `state` is `None` when nothing is active.
    #[serde(rename = "TIMER_STATE_RESPONSE")]
    StateResponse { state: Option<TimerState> },
}
