//! SQLite-backed timer-state repository.
//!
//! Implements the `TimerStateRepository` port over the shared connection
//! pool. The table holds at most one `active` row in practice; `put` is an
//! upsert by primary key so heartbeat refreshes and starts share one path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chronoboard_core::TimerStateRepository as TimerStateRepositoryPort;
use chronoboard_domain::{ChronoBoardError, Result as DomainResult, TimerState, TimerStatus};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::DbManager;
use crate::errors::InfraError;

/// Timer-state repository backed by SQLite.
pub struct SqliteTimerStateRepository {
    db: Arc<DbManager>,
}

impl SqliteTimerStateRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TimerStateRepositoryPort for SqliteTimerStateRepository {
    async fn get(&self, task_id: &str) -> DomainResult<Option<TimerState>> {
        let db = Arc::clone(&self.db);
        let task_id = task_id.to_string();
        task::spawn_blocking(move || -> DomainResult<Option<TimerState>> {
            let conn = db.get_connection()?;
            match conn.query_row(GET_STATE_SQL, params![task_id], map_state_row) {
                Ok(state) => Ok(Some(state)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(InfraError::from(err).into()),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn put(&self, state: &TimerState) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let state = state.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                UPSERT_STATE_SQL,
                params![
                    state.task_id,
                    state.start_time.timestamp_millis(),
                    state.last_update_time.timestamp_millis(),
                    status_to_str(state.status),
                ],
            )
            .map_err(|err| ChronoBoardError::from(InfraError::from(err)))?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, task_id: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let task_id = task_id.to_string();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(DELETE_STATE_SQL, params![task_id])
                .map_err(|err| ChronoBoardError::from(InfraError::from(err)))?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_all(&self) -> DomainResult<Vec<TimerState>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Vec<TimerState>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(ALL_STATES_SQL)
                .map_err(|err| ChronoBoardError::from(InfraError::from(err)))?;
            let states = stmt
                .query_map([], map_state_row)
                .and_then(Iterator::collect)
                .map_err(|err| ChronoBoardError::from(InfraError::from(err)))?;
            Ok(states)
        })
        .await
        .map_err(map_join_error)?
    }
}

const GET_STATE_SQL: &str =
    "SELECT task_id, start_time, last_update_time, status FROM timer_state WHERE task_id = ?1";

const UPSERT_STATE_SQL: &str = "INSERT OR REPLACE INTO timer_state (
        task_id, start_time, last_update_time, status
    ) VALUES (?1, ?2, ?3, ?4)";

const DELETE_STATE_SQL: &str = "DELETE FROM timer_state WHERE task_id = ?1";

const ALL_STATES_SQL: &str =
    "SELECT task_id, start_time, last_update_time, status FROM timer_state";

fn map_state_row(row: &Row<'_>) -> rusqlite::Result<TimerState> {
    Ok(TimerState {
        task_id: row.get(0)?,
        start_time: ms_to_datetime(row.get(1)?),
        last_update_time: ms_to_datetime(row.get(2)?),
        status: status_from_str(&row.get::<_, String>(3)?),
    })
}

fn status_to_str(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Active => "active",
        TimerStatus::Paused => "paused",
        TimerStatus::Stopped => "stopped",
    }
}

/// Unrecognized stored values read as `Stopped`, which readers treat the same
/// as "no active timer".
fn status_from_str(value: &str) -> TimerStatus {
    match value {
        "active" => TimerStatus::Active,
        "paused" => TimerStatus::Paused,
        _ => TimerStatus::Stopped,
    }
}

/// Out-of-range millis clamp to the epoch rather than failing the row.
fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

fn map_join_error(err: task::JoinError) -> ChronoBoardError {
    if err.is_cancelled() {
        ChronoBoardError::Internal("blocking timer-state task cancelled".into())
    } else {
        ChronoBoardError::Internal(format!("blocking timer-state task failed: {err}"))
    }
}
