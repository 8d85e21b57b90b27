//! Reactive timer controller.
//!
//! Bridges `TimerService` into a pollable view for UI layers: a watch channel
//! carries the current `TimerView`, and while a timer is active a 1 s tick
//! recomputes elapsed time from the absolute session start - never from an
//! accumulated counter - so the value stays correct across suspended or
//! restarted pages.
//!
//! The controller updates its view only after the service call resolves.
//! Switching tasks therefore appears as one atomic view transition, and a
//! failed operation surfaces in `error` while the previous known-good view
//! stays intact.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use chronoboard_core::TimerService;
use chronoboard_domain::{Result, TimeEntry, TimerConfig, TimerEvent, TimerState};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::utils::logging::{error_label, log_command_execution};

/// UI-facing timer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerViewStatus {
    Idle,
    Active,
}

/// Reactive view state consumed by task cards and the board header
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub active_task_id: Option<String>,
    pub status: TimerViewStatus,
    pub elapsed_secs: i64,
    /// Boot-time initialization flag; false once hydration resolved,
    /// regardless of outcome.
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for TimerView {
    fn default() -> Self {
        Self {
            active_task_id: None,
            status: TimerViewStatus::Idle,
            elapsed_secs: 0,
            loading: true,
            error: None,
        }
    }
}

/// Reactive wrapper around [`TimerService`]
pub struct TimerController {
    service: Arc<TimerService>,
    view_tx: watch::Sender<TimerView>,
    tick_interval: Duration,
    tick_cancel: Mutex<Option<CancellationToken>>,
    tick_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TimerController {
    /// Create a controller; callers run [`Self::init`] once to hydrate it.
    pub fn new(service: Arc<TimerService>, config: &TimerConfig) -> Self {
        let (view_tx, _) = watch::channel(TimerView::default());
        Self {
            service,
            view_tx,
            tick_interval: Duration::from_millis(config.tick_interval_ms.max(1)),
            tick_cancel: Mutex::new(None),
            tick_handle: Mutex::new(None),
        }
    }

    /// Hydrate the view from the persisted timer state.
    ///
    /// Runs the staleness sweep first so an abandoned session from a previous
    /// run is reconciled before it can be displayed as live. `loading`
    /// transitions to false whatever the outcome.
    pub async fn init(&self) {
        let command_name = "timer::init";
        let started = Instant::now();

        let result = async {
            self.service.reconcile_stale().await?;
            self.service.get_active_timer().await
        }
        .await;

        log_command_execution(command_name, started.elapsed(), result.is_ok());
        match result {
            Ok(Some(state)) => self.apply_active(state).await,
            Ok(None) => self.view_tx.send_modify(|view| view.loading = false),
            Err(err) => {
                warn!(command = command_name, error_type = error_label(&err), "hydration failed");
                self.view_tx.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(err.to_string());
                });
            }
        }
    }

    /// Start (or switch to) the timer for `task_id`.
    ///
    /// The view transitions only after the service resolves; on failure the
    /// previous state stays displayed with `error` set.
    pub async fn start_timer(&self, task_id: &str) -> Result<TimerState> {
        let command_name = "timer::start";
        let started = Instant::now();

        let result = self.service.start_timer(task_id).await;
        log_command_execution(command_name, started.elapsed(), result.is_ok());

        match &result {
            Ok(state) => self.apply_active(state.clone()).await,
            Err(err) => self.set_error(command_name, err),
        }
        result
    }

    /// Stop the active timer, if any.
    pub async fn stop_timer(&self) -> Result<Option<TimeEntry>> {
        let command_name = "timer::stop";
        let started = Instant::now();

        let result = self.service.stop_timer().await;
        log_command_execution(command_name, started.elapsed(), result.is_ok());

        match &result {
            Ok(_) => self.set_idle().await,
            Err(err) => self.set_error(command_name, err),
        }
        result
    }

    /// Stable predicate for concurrently rendered task cards.
    pub fn is_active(&self, task_id: &str) -> bool {
        let view = self.view_tx.borrow();
        view.status == TimerViewStatus::Active && view.active_task_id.as_deref() == Some(task_id)
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<TimerView> {
        self.view_tx.subscribe()
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> TimerView {
        self.view_tx.borrow().clone()
    }

    /// Fold a keep-alive agent broadcast into the view.
    ///
    /// Handlers are idempotent: duplicate or reordered notifications collapse
    /// into the same view, and ground truth is re-read from the service
    /// rather than trusted from the message alone.
    pub async fn apply_event(&self, event: TimerEvent) {
        match event {
            TimerEvent::Started { task_id } => {
                match self.service.get_active_timer().await {
                    Ok(Some(state)) if state.task_id == task_id => self.apply_active(state).await,
                    // Stale notification; a later state response wins.
                    _ => {}
                }
            }
            TimerEvent::Stopped { task_id } => {
                let is_current = {
                    let view = self.view_tx.borrow();
                    view.active_task_id.as_deref() == Some(task_id.as_str())
                };
                if is_current {
                    self.set_idle().await;
                }
            }
            TimerEvent::StateResponse { state } => match state {
                Some(state) if state.is_active() => self.apply_active(state).await,
                _ => self.set_idle().await,
            },
        }
    }

    /// Stop the elapsed tick; used on shutdown.
    pub async fn shutdown(&self) {
        self.stop_tick().await;
    }

    /// One atomic view transition into the active state, then (re)start the
    /// elapsed tick anchored at the session's absolute start.
    async fn apply_active(&self, state: TimerState) {
        let elapsed = state.elapsed_seconds(Utc::now());
        self.view_tx.send_modify(|view| {
            view.active_task_id = Some(state.task_id.clone());
            view.status = TimerViewStatus::Active;
            view.elapsed_secs = elapsed;
            view.loading = false;
            view.error = None;
        });
        self.ensure_tick(state.start_time).await;
    }

    async fn set_idle(&self) {
        self.stop_tick().await;
        self.view_tx.send_modify(|view| {
            view.active_task_id = None;
            view.status = TimerViewStatus::Idle;
            view.elapsed_secs = 0;
            view.loading = false;
            view.error = None;
        });
    }

    fn set_error(&self, command_name: &str, err: &chronoboard_domain::ChronoBoardError) {
        warn!(command = command_name, error_type = error_label(err), "command failed");
        self.view_tx.send_modify(|view| {
            view.loading = false;
            view.error = Some(err.to_string());
        });
    }

    async fn ensure_tick(&self, start_time: DateTime<Utc>) {
        self.stop_tick().await;

        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let view_tx = self.view_tx.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.tick().await; // Skip first immediate tick
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        // Pure recomputation from the absolute start; correct
                        // even after the task was starved for a while.
                        let elapsed = (Utc::now() - start_time).num_seconds().max(0);
                        view_tx.send_modify(|view| view.elapsed_secs = elapsed);
                    }
                }
            }
        });

        *self.tick_cancel.lock().await = Some(cancel);
        *self.tick_handle.lock().await = Some(handle);
    }

    async fn stop_tick(&self) {
        if let Some(cancel) = self.tick_cancel.lock().await.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.tick_handle.lock().await.take() {
            let _ = handle.await;
        }
    }
}
