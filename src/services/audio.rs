//! Goal chime synthesis and playback
//!
//! The chime is a short 880 Hz sine tone with a fast linear attack and an
//! exponential decay. Playback is best-effort: the audio device is probed
//! once at startup and the result is kept as a capability flag, so a machine
//! without an output pathway simply stays silent. The rodio output stream is
//! not `Send`, so a dedicated thread owns it and receives play requests over
//! a channel.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use rodio::buffer::SamplesBuffer;
use rodio::OutputStream;
use tracing::debug;

const SAMPLE_RATE: u32 = 44_100;
const TONE_HZ: f32 = 880.0;
const ATTACK_SECS: f32 = 0.01;
const DECAY_SECS: f32 = 0.35;
const PEAK_GAIN: f32 = 0.08;
const FLOOR_GAIN: f32 = 0.0001;

/// Handle to the audio thread. Cheap to call; `play` is fire-and-forget.
pub struct GoalChime {
    enabled: Arc<AtomicBool>,
    tx: Option<mpsc::Sender<()>>,
}

impl GoalChime {
    /// Spawn the audio thread and probe the default output device. The
    /// returned handle reports whether playback is available.
    pub fn start() -> Self {
        let enabled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<()>();

        let flag = Arc::clone(&enabled);
        thread::spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    debug!("No audio output device: {}", e);
                    let _ = ready_tx.send(());
                    return;
                }
            };
            flag.store(true, Ordering::SeqCst);
            let _ = ready_tx.send(());

            let samples = chime_samples();
            while rx.recv().is_ok() {
                let source = SamplesBuffer::new(1, SAMPLE_RATE, samples.clone());
                if let Err(e) = handle.play_raw(source) {
                    debug!("Chime playback failed: {}", e);
                }
            }
        });

        // Wait for the probe so callers can report capability at startup.
        let _ = ready_rx.recv();
        Self {
            enabled,
            tx: Some(tx),
        }
    }

    /// Handle that never plays anything. Used where audio is irrelevant.
    pub fn disabled() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(false)),
            tx: None,
        }
    }

    /// Check whether an output pathway was found at startup.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Queue one chime. A missing or failed audio pathway makes this a
    /// silent no-op.
    pub fn play(&self) {
        if !self.is_enabled() {
            return;
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(());
        }
    }
}

/// Render the chime into mono f32 samples: linear attack to [`PEAK_GAIN`]
/// over [`ATTACK_SECS`], then exponential decay to [`FLOOR_GAIN`].
fn chime_samples() -> Vec<f32> {
    let total = ((ATTACK_SECS + DECAY_SECS) * SAMPLE_RATE as f32).round() as usize;
    let mut samples = Vec::with_capacity(total);
    for i in 0..total {
        let t = i as f32 / SAMPLE_RATE as f32;
        let gain = if t < ATTACK_SECS {
            PEAK_GAIN * (t / ATTACK_SECS)
        } else {
            PEAK_GAIN * (FLOOR_GAIN / PEAK_GAIN).powf((t - ATTACK_SECS) / DECAY_SECS)
        };
        samples.push((t * TONE_HZ * TAU).sin() * gain);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_near(samples: &[f32], center: usize, radius: usize) -> f32 {
        let start = center.saturating_sub(radius);
        let end = (center + radius).min(samples.len());
        samples[start..end].iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_chime_length_matches_envelope() {
        // 360 ms of mono audio at 44.1 kHz.
        let samples = chime_samples();
        assert_eq!(samples.len(), 15_876);
    }

    #[test]
    fn test_chime_starts_silent_and_peaks_after_attack() {
        let samples = chime_samples();
        assert_eq!(samples[0], 0.0);

        // One sine period is 50 samples at 880 Hz, so a crest falls inside
        // a 100-sample window around the end of the 10 ms attack.
        let attack_end = (0.01 * 44_100.0) as usize;
        let peak = peak_near(&samples, attack_end, 50);
        assert!(peak > 0.06 && peak <= PEAK_GAIN + 1e-6, "peak was {}", peak);
    }

    #[test]
    fn test_chime_decays_monotonically() {
        let samples = chime_samples();
        let at = |secs: f32| peak_near(&samples, (secs * 44_100.0) as usize, 60);
        let early = at(0.05);
        let mid = at(0.15);
        let late = at(0.30);
        assert!(early > mid && mid > late, "{} {} {}", early, mid, late);
        assert!(at(0.35) < 0.001);
    }

    #[test]
    fn test_disabled_chime_is_silent_noop() {
        let chime = GoalChime::disabled();
        assert!(!chime.is_enabled());
        chime.play();
    }
}
