//! Mock repository implementations for testing
//!
//! In-memory mocks for the timer store ports, enabling deterministic unit
//! tests without database dependencies. Both mocks can be switched into a
//! failing mode to exercise the service's storage-failure policies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chronoboard_domain::{ChronoBoardError, Result as DomainResult, TimeEntry, TimerState};
use chronoboard_core::{TimeEntryRepository, TimerStateRepository};
use parking_lot::Mutex;

/// In-memory mock for `TimerStateRepository`.
#[derive(Default, Clone)]
pub struct MockTimerStateRepository {
    states: Arc<Mutex<HashMap<String, TimerState>>>,
    fail_puts: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl MockTimerStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a state directly, bypassing the service.
    pub fn with_state(self, state: TimerState) -> Self {
        self.states.lock().insert(state.task_id.clone(), state);
        self
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }
}

#[async_trait]
impl TimerStateRepository for MockTimerStateRepository {
    async fn get(&self, task_id: &str) -> DomainResult<Option<TimerState>> {
        Ok(self.states.lock().get(task_id).cloned())
    }

    async fn put(&self, state: &TimerState) -> DomainResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ChronoBoardError::Storage("injected put failure".into()));
        }
        self.states.lock().insert(state.task_id.clone(), state.clone());
        Ok(())
    }

    async fn delete(&self, task_id: &str) -> DomainResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ChronoBoardError::Storage("injected delete failure".into()));
        }
        self.states.lock().remove(task_id);
        Ok(())
    }

    async fn get_all(&self) -> DomainResult<Vec<TimerState>> {
        Ok(self.states.lock().values().cloned().collect())
    }
}

/// In-memory mock for `TimeEntryRepository`.
#[derive(Default, Clone)]
pub struct MockTimeEntryRepository {
    entries: Arc<Mutex<Vec<TimeEntry>>>,
    fail_adds: Arc<AtomicBool>,
}

impl MockTimeEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<TimeEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[async_trait]
impl TimeEntryRepository for MockTimeEntryRepository {
    async fn add(&self, entry: TimeEntry) -> DomainResult<String> {
        if self.fail_adds.load(Ordering::SeqCst) {
            return Err(ChronoBoardError::Storage("injected add failure".into()));
        }
        let id = entry.id.clone();
        self.entries.lock().push(entry);
        Ok(id)
    }

    async fn find_by_task(&self, task_id: &str) -> DomainResult<Vec<TimeEntry>> {
        let mut entries: Vec<TimeEntry> = self
            .entries
            .lock()
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.start_time);
        Ok(entries)
    }
}
