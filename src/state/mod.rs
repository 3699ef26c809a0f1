//! State management module
//!
//! This module contains all state-related structures and their management logic.

pub mod app_state;
pub mod timer;

// Re-export main types
pub use app_state::{AppState, TimerEvent, TimerSnapshot, CONFETTI_BURST_COUNT};
pub use timer::{format_hms, parse_goal_minutes, TimerClock, DEFAULT_GOAL_MINUTES};
