//! SQLite persistence layer

pub mod manager;
pub mod time_entry_repository;
pub mod timer_state_repository;

pub use manager::{DbManager, PooledSqliteConnection};
pub use time_entry_repository::SqliteTimeEntryRepository;
pub use timer_state_repository::SqliteTimerStateRepository;
