//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use chronoboard_core::{TimeEntryRepository, TimerService, TimerStateRepository};
use chronoboard_domain::{ChronoBoardError, Config, Result, TimerCommand, TimerEvent};
use chronoboard_infra::{
    config as config_loader, DbManager, KeepAliveAgent, KeepAliveConfig,
    SqliteTimeEntryRepository, SqliteTimerStateRepository,
};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::info;

use crate::controller::TimerController;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub timer_service: Arc<TimerService>,
    pub timer_controller: Arc<TimerController>,

    // The agent needs &mut for its lifecycle; everything else is shared.
    keepalive: Mutex<KeepAliveAgent>,
}

impl AppContext {
    /// Build the context from the ambient configuration sources.
    pub async fn new() -> Result<Self> {
        let config = config_loader::load()?;
        Self::with_config(config).await
    }

    /// Build the context from an explicit configuration.
    pub async fn with_config(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        db.health_check()?;

        let timer_states: Arc<dyn TimerStateRepository> =
            Arc::new(SqliteTimerStateRepository::new(Arc::clone(&db)));
        let time_entries: Arc<dyn TimeEntryRepository> =
            Arc::new(SqliteTimeEntryRepository::new(Arc::clone(&db)));

        let timer_service = Arc::new(
            TimerService::new(timer_states, time_entries)
                .with_stale_after(chrono::Duration::seconds(config.timer.stale_after_secs as i64)),
        );

        let keepalive = KeepAliveAgent::with_config(
            Arc::clone(&timer_service),
            KeepAliveConfig {
                heartbeat_interval: Duration::from_secs(config.timer.heartbeat_interval_secs),
            },
        );

        let timer_controller =
            Arc::new(TimerController::new(Arc::clone(&timer_service), &config.timer));
        timer_controller.init().await;

        info!(db_path = %config.database.path, "application context initialised");

        Ok(Self {
            config,
            db,
            timer_service,
            timer_controller,
            keepalive: Mutex::new(keepalive),
        })
    }

    /// Start the background keep-alive agent.
    pub async fn start_background(&self) -> Result<()> {
        self.keepalive.lock().await.start().await.map_err(ChronoBoardError::from)
    }

    /// Handle for sending page commands to the keep-alive agent.
    pub async fn agent_command_sender(&self) -> mpsc::Sender<TimerCommand> {
        self.keepalive.lock().await.command_sender()
    }

    /// Subscribe a page to keep-alive agent broadcasts.
    pub async fn subscribe_agent(&self) -> broadcast::Receiver<TimerEvent> {
        self.keepalive.lock().await.subscribe()
    }

    /// Stop background work gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.timer_controller.shutdown().await;

        let mut agent = self.keepalive.lock().await;
        if agent.is_running() {
            agent.stop().await.map_err(ChronoBoardError::from)?;
        }
        Ok(())
    }
}
