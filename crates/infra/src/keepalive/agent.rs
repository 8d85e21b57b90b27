//! Background keep-alive agent.
//!
//! The agent is the counterpart of a foreground page's controller: it lives
//! in its own task, outlasts any single page, and talks to pages only through
//! messages. Inbound commands arrive on an mpsc inbox; outbound notifications
//! fan out on a broadcast channel every connected page subscribes to.
//!
//! While a timer is active the agent refreshes `last_update_time` on a fixed
//! interval so elapsed-time recovery always has a recent heartbeat to reason
//! about. On activation it re-scans the store and resumes the heartbeat for
//! any lingering active record, so the heartbeat never silently dies across
//! agent restarts.
//!
//! No failure inside the loop is allowed to crash it: storage errors are
//! logged and the loop continues, favoring heartbeat availability over strict
//! error reporting.

use std::sync::Arc;
use std::time::Duration;

use chronoboard_core::TimerService;
use chronoboard_domain::constants::{AGENT_COMMAND_QUEUE, AGENT_EVENT_QUEUE};
use chronoboard_domain::{TimerCommand, TimerConfig, TimerEvent};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{AgentError, AgentResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Type alias for the shared command inbox
type CommandInbox = Arc<Mutex<mpsc::Receiver<TimerCommand>>>;

/// Configuration for the keep-alive agent
#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
    /// Heartbeat refresh period
    pub heartbeat_interval: Duration,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        let timer = TimerConfig::default();
        Self { heartbeat_interval: Duration::from_secs(timer.heartbeat_interval_secs) }
    }
}

/// Context for the agent loop to avoid too many arguments (clippy)
struct AgentLoopContext {
    service: Arc<TimerService>,
    inbox: CommandInbox,
    events: broadcast::Sender<TimerEvent>,
    heartbeat_interval: Duration,
}

/// Service-worker-style background agent with explicit lifecycle management
pub struct KeepAliveAgent {
    service: Arc<TimerService>,
    config: KeepAliveConfig,
    commands_tx: mpsc::Sender<TimerCommand>,
    inbox: CommandInbox,
    events_tx: broadcast::Sender<TimerEvent>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl KeepAliveAgent {
    /// Create a new agent with the default heartbeat period
    pub fn new(service: Arc<TimerService>) -> Self {
        Self::with_config(service, KeepAliveConfig::default())
    }

    /// Create a new agent with an explicit configuration
    pub fn with_config(service: Arc<TimerService>, config: KeepAliveConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(AGENT_COMMAND_QUEUE);
        let (events_tx, _) = broadcast::channel(AGENT_EVENT_QUEUE);

        Self {
            service,
            config,
            commands_tx,
            inbox: Arc::new(Mutex::new(commands_rx)),
            events_tx,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle for pages to send commands to the agent
    pub fn command_sender(&self) -> mpsc::Sender<TimerCommand> {
        self.commands_tx.clone()
    }

    /// Subscribe a page to the agent's broadcast notifications
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    /// Start the agent
    ///
    /// Spawns the background task that owns the heartbeat and the message
    /// loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is already running
    pub async fn start(&mut self) -> AgentResult<()> {
        if self.is_running() {
            return Err(AgentError::AlreadyRunning);
        }

        info!("Starting keep-alive agent");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let context = AgentLoopContext {
            service: Arc::clone(&self.service),
            inbox: Arc::clone(&self.inbox),
            events: self.events_tx.clone(),
            heartbeat_interval: self.config.heartbeat_interval,
        };
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::agent_loop(context, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Keep-alive agent started");
        Ok(())
    }

    /// Stop the agent gracefully
    ///
    /// # Errors
    ///
    /// Returns an error if the agent is not running
    pub async fn stop(&mut self) -> AgentResult<()> {
        if !self.is_running() {
            return Err(AgentError::NotRunning);
        }

        info!("Stopping keep-alive agent");

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| AgentError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|err| AgentError::TaskJoinFailed(err.to_string()))?;
        }

        info!("Keep-alive agent stopped");
        Ok(())
    }

    /// Check if the agent is running
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// Background message + heartbeat loop
    async fn agent_loop(context: AgentLoopContext, cancel: CancellationToken) {
        let AgentLoopContext { service, inbox, events, heartbeat_interval } = context;

        let mut heartbeat_live = Self::activate(&service).await;

        let mut inbox = inbox.lock().await;
        let mut interval = tokio::time::interval(heartbeat_interval);
        interval.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Agent loop cancelled");
                    break;
                }
                maybe_command = inbox.recv() => {
                    match maybe_command {
                        Some(command) => {
                            Self::handle_command(&service, &events, &mut heartbeat_live, command)
                                .await;
                        }
                        None => {
                            debug!("Command channel closed; agent loop exiting");
                            break;
                        }
                    }
                }
                _ = interval.tick() => {
                    if heartbeat_live {
                        heartbeat_live = Self::refresh_heartbeat(&service).await;
                    }
                }
            }
        }
    }

    /// Activation rescan: reconcile abandoned state, then resume the
    /// heartbeat if a live active record remains.
    async fn activate(service: &Arc<TimerService>) -> bool {
        if let Err(err) = service.reconcile_stale().await {
            error!(error = %err, "Stale-timer reconciliation failed on activation");
        }

        match service.get_active_timer().await {
            Ok(Some(state)) => {
                info!(task_id = %state.task_id, "Resuming heartbeat for persisted active timer");
                true
            }
            Ok(None) => false,
            Err(err) => {
                error!(error = %err, "Active-timer rescan failed on activation");
                false
            }
        }
    }

    async fn refresh_heartbeat(service: &Arc<TimerService>) -> bool {
        match service.touch_active().await {
            Ok(Some(state)) => {
                debug!(task_id = %state.task_id, "Heartbeat refreshed");
                true
            }
            // Timer was stopped by another context; nothing left to touch.
            Ok(None) => false,
            Err(err) => {
                error!(error = %err, "Heartbeat refresh failed");
                true
            }
        }
    }

    /// Apply one inbound command. Handlers are idempotent against duplicate
    /// or reordered messages and never propagate errors upward.
    async fn handle_command(
        service: &Arc<TimerService>,
        events: &broadcast::Sender<TimerEvent>,
        heartbeat_live: &mut bool,
        command: TimerCommand,
    ) {
        match command {
            TimerCommand::Start { task_id, start_time } => {
                match service.start_timer_at(&task_id, start_time).await {
                    Ok(state) => {
                        *heartbeat_live = true;
                        Self::broadcast(events, TimerEvent::Started { task_id: state.task_id });
                    }
                    Err(err) => {
                        error!(task_id, error = %err, "TIMER_START handling failed");
                    }
                }
            }
            TimerCommand::Stop { task_id } => {
                Self::handle_stop(service, events, heartbeat_live, task_id).await;
            }
            TimerCommand::StateRequest {} => {
                // Best-effort: a failed query still answers with a null state
                // so no page is left waiting.
                let state = match service.get_active_timer().await {
                    Ok(state) => state,
                    Err(err) => {
                        error!(error = %err, "TIMER_STATE_REQUEST handling failed");
                        None
                    }
                };
                Self::broadcast(events, TimerEvent::StateResponse { state });
            }
            TimerCommand::Unknown => {
                warn!("Ignoring unknown timer message type");
            }
        }
    }

    async fn handle_stop(
        service: &Arc<TimerService>,
        events: &broadcast::Sender<TimerEvent>,
        heartbeat_live: &mut bool,
        task_id: String,
    ) {
        match service.get_active_timer().await {
            Ok(Some(active)) if active.task_id == task_id => match service.stop_timer().await {
                Ok(_) => {
                    *heartbeat_live = false;
                    Self::broadcast(events, TimerEvent::Stopped { task_id });
                }
                Err(err) => {
                    error!(task_id, error = %err, "TIMER_STOP handling failed");
                }
            },
            // No matching active session: a duplicate or reordered stop.
            // Acknowledge idempotently without touching whatever is active.
            Ok(_) => {
                Self::broadcast(events, TimerEvent::Stopped { task_id });
            }
            Err(err) => {
                error!(task_id, error = %err, "TIMER_STOP lookup failed");
            }
        }
    }

    /// A send error only means no pages are subscribed right now; other
    /// receivers are unaffected, so delivery failures are never fatal.
    fn broadcast(events: &broadcast::Sender<TimerEvent>, event: TimerEvent) {
        if events.send(event).is_err() {
            debug!("No connected pages for timer event broadcast");
        }
    }
}
