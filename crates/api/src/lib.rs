//! # ChronoBoard App
//!
//! Application layer - reactive timer controller and main entry point.
//!
//! This crate contains:
//! - The reactive `TimerController` consumed by UI layers
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Exposes a pollable view of the timer state machine

pub mod context;
pub mod controller;
pub mod utils;

// Re-export for convenience
pub use context::AppContext;
pub use controller::{TimerController, TimerView, TimerViewStatus};
