//! Timer service - core business logic
//!
//! Single source of truth for starting and stopping the active timer and for
//! computing elapsed time. Encapsulates the "at most one active timer"
//! invariant: starting a timer for task B while task A is active closes A out
//! as a `TimeEntry` before B becomes active. All writes to the timer-state
//! table go through this service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chronoboard_domain::constants::STALE_TIMER_AFTER_SECS;
use chronoboard_domain::{Result, TimeEntry, TimerState};
use tracing::{info, warn};

use super::ports::{TimeEntryRepository, TimerStateRepository};

/// Timer state machine over the injected store ports
pub struct TimerService {
    timer_states: Arc<dyn TimerStateRepository>,
    time_entries: Arc<dyn TimeEntryRepository>,
    stale_after: Duration,
}

impl TimerService {
    /// Create a new timer service
    pub fn new(
        timer_states: Arc<dyn TimerStateRepository>,
        time_entries: Arc<dyn TimeEntryRepository>,
    ) -> Self {
        Self { timer_states, time_entries, stale_after: Duration::seconds(STALE_TIMER_AFTER_SECS as i64) }
    }

    /// Override the staleness threshold used by [`Self::reconcile_stale`].
    ///
    /// Should stay a generous multiple of the heartbeat period so a single
    /// missed heartbeat never closes out a live session.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Start a timer for `task_id`, stopping any other active timer first.
    ///
    /// If the active timer already belongs to `task_id`, the call is a no-op
    /// and returns the existing state unchanged; restarting the clock would
    /// silently discard accumulated time.
    pub async fn start_timer(&self, task_id: &str) -> Result<TimerState> {
        self.start_timer_at(task_id, Utc::now()).await
    }

    /// [`Self::start_timer`] with an explicit session start.
    ///
    /// The keep-alive agent uses this so a `TIMER_START` message persists the
    /// start timestamp the page observed rather than the agent's own clock.
    pub async fn start_timer_at(
        &self,
        task_id: &str,
        start_time: DateTime<Utc>,
    ) -> Result<TimerState> {
        if let Some(active) = self.find_active().await? {
            if active.task_id == task_id {
                return Ok(active);
            }
            // The old session ends where the new one begins, keeping entries
            // non-overlapping.
            self.close_out(&active, start_time).await?;
        }

        let state = TimerState::started(task_id, start_time);
        self.timer_states.put(&state).await?;
        info!(task_id, "timer started");
        Ok(state)
    }

    /// Stop the active timer, producing its `TimeEntry`.
    ///
    /// Stopping with nothing active is a valid no-op and returns `Ok(None)`.
    pub async fn stop_timer(&self) -> Result<Option<TimeEntry>> {
        let Some(active) = self.find_active().await? else {
            return Ok(None);
        };

        let entry = self.close_out(&active, Utc::now()).await?;
        Ok(Some(entry))
    }

    /// Elapsed whole seconds for the active timer.
    ///
    /// With `task_id` given, returns a non-zero value only if it matches the
    /// currently active task. Never negative.
    pub async fn get_elapsed_time(&self, task_id: Option<&str>) -> Result<i64> {
        let now = Utc::now();
        Ok(match self.find_active().await? {
            Some(active) if task_id.map_or(true, |id| id == active.task_id) => {
                active.elapsed_seconds(now)
            }
            _ => 0,
        })
    }

    /// The current timer state, only while its status is `active`.
    ///
    /// Any other stored status is treated as "no active timer", tolerating
    /// partially written legacy records.
    pub async fn get_active_timer(&self) -> Result<Option<TimerState>> {
        self.find_active().await
    }

    /// Heartbeat: refresh `last_update_time` on the active record.
    ///
    /// Returns the refreshed state, or `None` when nothing is active.
    pub async fn touch_active(&self) -> Result<Option<TimerState>> {
        let Some(mut active) = self.find_active().await? else {
            return Ok(None);
        };

        active.last_update_time = Utc::now();
        self.timer_states.put(&active).await?;
        Ok(Some(active))
    }

    /// Staleness sweep: close out an abandoned active record.
    ///
    /// A record whose heartbeat is older than the configured threshold is
    /// reconciled into a `TimeEntry` ending at its last heartbeat - time the
    /// agent confirmed, not time invented after the process died. Returns the
    /// reconciled entry, or `None` when the active record is live or absent.
    pub async fn reconcile_stale(&self) -> Result<Option<TimeEntry>> {
        let now = Utc::now();
        let Some(active) = self.find_active().await? else {
            return Ok(None);
        };
        if !active.is_stale(now, self.stale_after) {
            return Ok(None);
        }

        warn!(
            task_id = %active.task_id,
            last_update = %active.last_update_time,
            "abandoned timer state reconciled"
        );
        let entry = self.close_out(&active, active.last_update_time).await?;
        Ok(Some(entry))
    }

    /// All completed entries for a task (board/report collaborators).
    pub async fn entries_for_task(&self, task_id: &str) -> Result<Vec<TimeEntry>> {
        self.time_entries.find_by_task(task_id).await
    }

    /// Close a session: write its entry, then delete the state.
    ///
    /// The entry write comes first so a failure between the two operations
    /// always errs toward preserving recorded time. A failed delete leaves a
    /// lingering state for the next start or the staleness sweep to clean up;
    /// the entry is returned regardless.
    async fn close_out(&self, state: &TimerState, end_time: DateTime<Utc>) -> Result<TimeEntry> {
        let entry = TimeEntry::from_session(state.task_id.clone(), state.start_time, end_time);
        self.time_entries.add(entry.clone()).await?;

        if let Err(err) = self.timer_states.delete(&state.task_id).await {
            warn!(
                task_id = %state.task_id,
                error = %err,
                "timer state delete failed after entry write; state left for recovery"
            );
        }

        info!(
            task_id = %state.task_id,
            duration_mins = entry.duration_mins,
            "session closed"
        );
        Ok(entry)
    }

    /// The single active record, resolving inconsistent stores defensively:
    /// if more than one active record is ever observed, the most recently
    /// updated one wins and a warning is logged.
    async fn find_active(&self) -> Result<Option<TimerState>> {
        let states = self.timer_states.get_all().await?;
        let mut active: Vec<TimerState> = states.into_iter().filter(TimerState::is_active).collect();

        match active.len() {
            0 => Ok(None),
            1 => Ok(active.pop()),
            n => {
                warn!(count = n, "multiple active timer states found; keeping most recent");
                active.sort_by_key(|state| state.last_update_time);
                Ok(active.pop())
            }
        }
    }
}
