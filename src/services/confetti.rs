//! Confetti particle bursts
//!
//! Celebration bursts spawn a batch of randomized particles into a shared
//! field. Clients read the live set from the status snapshot and animate it
//! however they like; the server only guarantees each particle disappears
//! exactly [`PARTICLE_LIFETIME`] after it was spawned, independent of its
//! own animation duration. There is no cap on concurrent particles, so
//! repeated bursts accumulate until their timeouts fire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How long a particle lives before it is removed.
const PARTICLE_LIFETIME: Duration = Duration::from_millis(5000);

const PALETTE: [&str; 5] = ["#ff5656", "#ffd166", "#06b6d4", "#7c3aed", "#60a5fa"];

/// Rendered outline of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleShape {
    Dot,
    Rect,
}

/// One ephemeral decorative particle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u64,
    /// Horizontal position as a percentage of the viewport width.
    pub x_percent: f32,
    /// Spawn height as a percentage of the viewport height, above the top edge.
    pub y_percent: f32,
    pub color: String,
    pub width_px: f32,
    pub height_px: f32,
    pub shape: ParticleShape,
    pub rotation_deg: f32,
    pub animation_secs: f32,
}

/// Shared set of live particles. Clones share the same field.
#[derive(Clone)]
pub struct ConfettiField {
    particles: Arc<Mutex<Vec<Particle>>>,
    next_id: Arc<AtomicU64>,
}

impl ConfettiField {
    pub fn new() -> Self {
        Self {
            particles: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawn `count` randomized particles and schedule each for removal
    /// after [`PARTICLE_LIFETIME`]. Must run inside a tokio runtime.
    pub fn spawn_burst(&self, count: usize) {
        let mut rng = rand::thread_rng();
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            batch.push(Particle {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                x_percent: rng.gen_range(0.0..100.0),
                y_percent: -10.0 - rng.gen_range(0.0..20.0),
                color: PALETTE[rng.gen_range(0..PALETTE.len())].to_string(),
                width_px: 6.0 + rng.gen_range(0.0..12.0),
                height_px: 8.0 + rng.gen_range(0.0..16.0),
                shape: if rng.gen_bool(0.4) {
                    ParticleShape::Rect
                } else {
                    ParticleShape::Dot
                },
                rotation_deg: rng.gen_range(0.0..360.0),
                animation_secs: 2.0 + rng.gen_range(0.0..3.0),
            });
        }

        let ids: Vec<u64> = batch.iter().map(|p| p.id).collect();
        match self.particles.lock() {
            Ok(mut particles) => particles.extend(batch),
            Err(e) => {
                warn!("Failed to lock confetti field: {}", e);
                return;
            }
        }

        for id in ids {
            let field = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(PARTICLE_LIFETIME).await;
                field.remove(id);
            });
        }
        debug!("Spawned {} confetti particles ({} live)", count, self.len());
    }

    fn remove(&self, id: u64) {
        if let Ok(mut particles) = self.particles.lock() {
            particles.retain(|p| p.id != id);
        }
    }

    /// Snapshot of the live particles.
    pub fn particles(&self) -> Vec<Particle> {
        self.particles
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.particles.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConfettiField {
    fn default() -> Self {
        Self::new()
    }
}
