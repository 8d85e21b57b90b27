//! Port interfaces for the timer store
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations. Each operation is atomic at
//! single-record granularity; nothing stronger is assumed.

use async_trait::async_trait;
use chronoboard_domain::{Result, TimeEntry, TimerState};

/// Trait for the timer-state table (at most one active record system-wide)
#[async_trait]
pub trait TimerStateRepository: Send + Sync {
    /// Get the timer state for a task, if present
    async fn get(&self, task_id: &str) -> Result<Option<TimerState>>;

    /// Upsert a timer state by its primary key (`task_id`)
    async fn put(&self, state: &TimerState) -> Result<()>;

    /// Delete the timer state for a task; deleting a missing record is a
    /// no-op
    async fn delete(&self, task_id: &str) -> Result<()>;

    /// All stored timer states (used to find the active record among at
    /// most one)
    async fn get_all(&self) -> Result<Vec<TimerState>>;
}

/// Trait for the append-only completed-entries table
#[async_trait]
pub trait TimeEntryRepository: Send + Sync {
    /// Persist a completed entry, returning its id
    async fn add(&self, entry: TimeEntry) -> Result<String>;

    /// All entries for a task, ordered by start time
    async fn find_by_task(&self, task_id: &str) -> Result<Vec<TimeEntry>>;
}
