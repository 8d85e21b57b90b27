//! SQLite-backed time-entry repository.
//!
//! The table is append-only: rows are inserted at stop time and never
//! updated. Range/report queries used by board collaborators go through
//! `find_by_task`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chronoboard_core::TimeEntryRepository as TimeEntryRepositoryPort;
use chronoboard_domain::{ChronoBoardError, Result as DomainResult, TimeEntry};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::DbManager;
use crate::errors::InfraError;

/// Time-entry repository backed by SQLite.
pub struct SqliteTimeEntryRepository {
    db: Arc<DbManager>,
}

impl SqliteTimeEntryRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TimeEntryRepositoryPort for SqliteTimeEntryRepository {
    async fn add(&self, entry: TimeEntry) -> DomainResult<String> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<String> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_ENTRY_SQL,
                params![
                    entry.id,
                    entry.task_id,
                    entry.start_time.timestamp_millis(),
                    entry.end_time.timestamp_millis(),
                    entry.duration_mins,
                    i64::from(entry.is_manual),
                    entry.created_at.timestamp_millis(),
                    entry.updated_at.timestamp_millis(),
                ],
            )
            .map_err(|err| ChronoBoardError::from(InfraError::from(err)))?;
            Ok(entry.id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_task(&self, task_id: &str) -> DomainResult<Vec<TimeEntry>> {
        let db = Arc::clone(&self.db);
        let task_id = task_id.to_string();
        task::spawn_blocking(move || -> DomainResult<Vec<TimeEntry>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(ENTRIES_BY_TASK_SQL)
                .map_err(|err| ChronoBoardError::from(InfraError::from(err)))?;
            let entries = stmt
                .query_map(params![task_id], map_entry_row)
                .and_then(Iterator::collect)
                .map_err(|err| ChronoBoardError::from(InfraError::from(err)))?;
            Ok(entries)
        })
        .await
        .map_err(map_join_error)?
    }
}

const INSERT_ENTRY_SQL: &str = "INSERT INTO time_entries (
        id, task_id, start_time, end_time, duration_mins,
        is_manual, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const ENTRIES_BY_TASK_SQL: &str = "SELECT id, task_id, start_time, end_time, duration_mins,
        is_manual, created_at, updated_at
    FROM time_entries
    WHERE task_id = ?1
    ORDER BY start_time";

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: row.get(0)?,
        task_id: row.get(1)?,
        start_time: ms_to_datetime(row.get(2)?),
        end_time: ms_to_datetime(row.get(3)?),
        duration_mins: row.get(4)?,
        is_manual: row.get::<_, i64>(5)? != 0,
        created_at: ms_to_datetime(row.get(6)?),
        updated_at: ms_to_datetime(row.get(7)?),
    })
}

fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

fn map_join_error(err: task::JoinError) -> ChronoBoardError {
    if err.is_cancelled() {
        ChronoBoardError::Internal("blocking time-entry task cancelled".into())
    } else {
        ChronoBoardError::Internal(format!("blocking time-entry task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn add_then_find_round_trips() {
        let (repo, _temp_dir) = setup_repository();
        let entry = sample_entry("t1", 0, 125_000);

        let id = repo.add(entry.clone()).await.expect("add succeeds");
        assert_eq!(id, entry.id);

        let entries = repo.find_by_task("t1").await.expect("find succeeds");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], entry);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn find_orders_by_start_time_and_filters_by_task() {
        let (repo, _temp_dir) = setup_repository();
        let later = sample_entry("t1", 600_000, 900_000);
        let earlier = sample_entry("t1", 0, 125_000);
        let other = sample_entry("t2", 300_000, 400_000);

        repo.add(later.clone()).await.expect("add later");
        repo.add(earlier.clone()).await.expect("add earlier");
        repo.add(other).await.expect("add other");

        let entries = repo.find_by_task("t1").await.expect("find succeeds");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, earlier.id);
        assert_eq!(entries[1].id, later.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_id_is_a_storage_error() {
        let (repo, _temp_dir) = setup_repository();
        let entry = sample_entry("t1", 0, 60_000);

        repo.add(entry.clone()).await.expect("first add");
        let err = repo.add(entry).await.expect_err("second add must fail");
        assert!(matches!(err, ChronoBoardError::Storage(_)));
    }

    fn setup_repository() -> (SqliteTimeEntryRepository, TempDir) {
        let temp_dir = TempDir::new().expect("tempdir created");
        let db_path = temp_dir.path().join("entries.db");

        let manager = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
        manager.run_migrations().expect("migrations run");

        (SqliteTimeEntryRepository::new(manager), temp_dir)
    }

    fn sample_entry(task_id: &str, start_ms: i64, end_ms: i64) -> TimeEntry {
        TimeEntry::from_session(task_id, ms_to_datetime(start_ms), ms_to_datetime(end_ms))
    }
}
