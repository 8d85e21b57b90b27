//! Lifecycle tests for the reactive timer controller and the app context.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chronoboard_app::{AppContext, TimerController, TimerViewStatus};
use chronoboard_core::TimerService;
use chronoboard_domain::{
    Config, DatabaseConfig, TimerCommand, TimerConfig, TimerEvent,
};
use chronoboard_infra::{DbManager, SqliteTimeEntryRepository, SqliteTimerStateRepository};
use tempfile::TempDir;

fn setup_service() -> (Arc<TimerService>, Arc<DbManager>, TempDir) {
    let temp_dir = TempDir::new().expect("tempdir created");
    let db_path = temp_dir.path().join("controller.db");

    let manager = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
    manager.run_migrations().expect("migrations run");

    let states = Arc::new(SqliteTimerStateRepository::new(Arc::clone(&manager)));
    let entries = Arc::new(SqliteTimeEntryRepository::new(Arc::clone(&manager)));
    let service = Arc::new(TimerService::new(states, entries));

    (service, manager, temp_dir)
}

fn controller_with_tick(service: Arc<TimerService>, tick_interval_ms: u64) -> TimerController {
    TimerController::new(service, &TimerConfig { tick_interval_ms, ..TimerConfig::default() })
}

#[tokio::test(flavor = "multi_thread")]
async fn init_with_empty_store_resolves_loading() {
    let (service, _db, _temp_dir) = setup_service();
    let controller = controller_with_tick(service, 1000);

    assert!(controller.view().loading);
    controller.init().await;

    let view = controller.view();
    assert!(!view.loading);
    assert_eq!(view.status, TimerViewStatus::Idle);
    assert!(view.active_task_id.is_none());
    assert!(view.error.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn init_seeds_view_from_persisted_state() {
    let (service, _db, _temp_dir) = setup_service();

    // A session persisted by a previous run, 30s old.
    let start = Utc::now() - chrono::Duration::seconds(30);
    service.start_timer_at("t1", start).await.expect("timer persisted");

    let controller = controller_with_tick(Arc::clone(&service), 1000);
    controller.init().await;

    let view = controller.view();
    assert!(!view.loading);
    assert_eq!(view.status, TimerViewStatus::Active);
    assert_eq!(view.active_task_id.as_deref(), Some("t1"));
    assert!((29..=31).contains(&view.elapsed_secs), "elapsed derived from persisted start");
    assert!(controller.is_active("t1"));

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn start_then_stop_transitions_view() {
    let (service, _db, _temp_dir) = setup_service();
    let controller = controller_with_tick(service, 1000);
    controller.init().await;

    controller.start_timer("t1").await.expect("start succeeds");
    assert!(controller.is_active("t1"));
    assert!(!controller.is_active("t2"));

    let entry = controller.stop_timer().await.expect("stop succeeds");
    assert!(entry.is_some());

    let view = controller.view();
    assert_eq!(view.status, TimerViewStatus::Idle);
    assert_eq!(view.elapsed_secs, 0);
    assert!(view.active_task_id.is_none());

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn switching_tasks_is_one_atomic_view_transition() {
    let (service, _db, _temp_dir) = setup_service();
    let controller = controller_with_tick(service, 1000);
    controller.init().await;

    controller.start_timer("t1").await.expect("start t1");

    let mut rx = controller.subscribe();
    controller.start_timer("t2").await.expect("start t2");

    // The first frame visible after the switch already shows t2 active;
    // no intermediate frame shows neither (or both) tasks active.
    rx.changed().await.expect("view updated");
    let view = rx.borrow().clone();
    assert_eq!(view.status, TimerViewStatus::Active);
    assert_eq!(view.active_task_id.as_deref(), Some("t2"));

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn storage_failure_preserves_known_good_state() {
    let (service, db, _temp_dir) = setup_service();
    let controller = controller_with_tick(service, 1000);
    controller.init().await;

    controller.start_timer("t1").await.expect("start succeeds");

    // Break the entries table so the next stop cannot write its entry.
    let conn = db.get_connection().expect("connection");
    conn.execute("DROP TABLE time_entries", []).expect("table dropped");

    let err = controller.stop_timer().await.expect_err("stop must fail");
    let view = controller.view();
    assert_eq!(view.status, TimerViewStatus::Active, "previous state still displayed");
    assert_eq!(view.active_task_id.as_deref(), Some("t1"));
    assert_eq!(view.error.as_deref(), Some(err.to_string().as_str()));

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn tick_recomputes_elapsed_from_absolute_start() {
    let (service, _db, _temp_dir) = setup_service();

    let start = Utc::now() - chrono::Duration::seconds(100);
    service.start_timer_at("t1", start).await.expect("timer persisted");

    let controller = controller_with_tick(Arc::clone(&service), 50);
    controller.init().await;

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Derived from the absolute start, not from ticks accumulated since init.
    let view = controller.view();
    assert!(view.elapsed_secs >= 100, "elapsed {} not derived from start", view.elapsed_secs);

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn agent_events_fold_into_view_idempotently() {
    let (service, _db, _temp_dir) = setup_service();
    let controller = controller_with_tick(Arc::clone(&service), 1000);
    controller.init().await;

    let state = service.start_timer("t1").await.expect("timer persisted");

    controller.apply_event(TimerEvent::StateResponse { state: Some(state) }).await;
    assert!(controller.is_active("t1"));

    controller.apply_event(TimerEvent::Stopped { task_id: "t1".to_string() }).await;
    assert_eq!(controller.view().status, TimerViewStatus::Idle);

    // Duplicate delivery is harmless.
    controller.apply_event(TimerEvent::Stopped { task_id: "t1".to_string() }).await;
    assert_eq!(controller.view().status, TimerViewStatus::Idle);

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn context_wires_agent_and_controller_end_to_end() {
    let temp_dir = TempDir::new().expect("tempdir created");
    let config = Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("app.db").to_string_lossy().into_owned(),
            pool_size: 2,
        },
        timer: TimerConfig { tick_interval_ms: 100, ..TimerConfig::default() },
    };

    let ctx = AppContext::with_config(config).await.expect("context built");
    ctx.start_background().await.expect("agent started");

    let commands = ctx.agent_command_sender().await;
    let mut events = ctx.subscribe_agent().await;

    commands
        .send(TimerCommand::Start { task_id: "t-board".to_string(), start_time: Utc::now() })
        .await
        .expect("command sent");

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("event within timeout")
        .expect("broadcast open");
    assert_eq!(event, TimerEvent::Started { task_id: "t-board".to_string() });

    // A page folds the broadcast into its reactive view.
    ctx.timer_controller.apply_event(event).await;
    assert!(ctx.timer_controller.is_active("t-board"));

    ctx.shutdown().await.expect("clean shutdown");
}
