//! Completed time entries
//!
//! Entries are append-only and immutable once created. The timer core writes
//! one entry per completed session at stop time, with both bounds set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Immutable record of a completed tracked session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whole minutes, rounded to nearest, clamped at 0.
    pub duration_mins: i64,
    /// False for every entry the timer core produces; reserved true for
    /// manually entered entries created elsewhere.
    pub is_manual: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Build the entry for a tracked session that ended at `end_time`.
    ///
    /// A zero or negative elapsed duration is a valid degenerate session, not
    /// an error: the duration clamps to 0 and the entry is still created.
    pub fn from_session(
        task_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            start_time,
            end_time,
            duration_mins: session_minutes(start_time, end_time),
            is_manual: false,
            created_at: end_time,
            updated_at: end_time,
        }
    }
}

/// `max(0, round((end - start) / 60_000 ms))`.
fn session_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let rounded = ((end - start).num_milliseconds() as f64 / MS_PER_MINUTE).round() as i64;
    rounded.max(0)
}
