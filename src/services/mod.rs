//! Feedback emitter services
//!
//! This module contains the fire-and-forget celebration effects: an
//! audible chime and a confetti particle burst. Both are best-effort and
//! never surface errors.

pub mod audio;
pub mod confetti;

// Re-export main types
pub use audio::GoalChime;
pub use confetti::{ConfettiField, Particle, ParticleShape};
