//! Timer state record
//!
//! At most one `active` record exists in the store at any time. The record is
//! keyed by task so "no timer running" is expressed by absence rather than by
//! a sentinel row.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a timer record.
///
/// Only `Active` records are persisted in practice; `Paused` and `Stopped`
/// are reserved terminal values. Readers must treat anything other than
/// `Active` as "no timer running".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Active,
    Paused,
    Stopped,
}

/// The persisted record describing the one currently running session, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Identifier of the task being timed; primary key of the record.
    pub task_id: String,
    /// When the current session began.
    pub start_time: DateTime<Utc>,
    /// Most recent heartbeat; staleness detection input.
    pub last_update_time: DateTime<Utc>,
    pub status: TimerStatus,
}

impl TimerState {
    /// Build a fresh `Active` record whose heartbeat equals its start.
    pub fn started(task_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            start_time,
            last_update_time: start_time,
            status: TimerStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TimerStatus::Active
    }

    /// Elapsed whole seconds at `now`, derived from the absolute start
    /// timestamp. Never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds().max(0)
    }

    /// Whether the heartbeat is older than `threshold` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now - self.last_update_time > threshold
    }
}
