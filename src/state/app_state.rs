//! Main application state management

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use crate::services::{ConfettiField, GoalChime};
use crate::storage::BestTimeStore;

use super::timer::{format_hms, parse_goal_minutes, progress_percent, TimerClock};

/// Particles spawned per celebration burst.
pub const CONFETTI_BURST_COUNT: usize = 40;

/// Timer lifecycle notifications consumed by the refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Stopped,
}

/// Point-in-time view of the timer for display surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub running: bool,
    pub elapsed: String,
    pub elapsed_ms: u64,
    pub progress_percent: f64,
    pub goal_minutes: u64,
    pub best: Option<String>,
    pub best_ms: Option<u64>,
    pub can_start: bool,
    pub can_pause: bool,
}

impl TimerSnapshot {
    fn idle(goal_minutes: u64) -> Self {
        Self {
            running: false,
            elapsed: format_hms(0),
            elapsed_ms: 0,
            progress_percent: 0.0,
            goal_minutes,
            best: None,
            best_ms: None,
            can_start: true,
            can_pause: false,
        }
    }
}

/// Main application state that owns the timer, the goal, the best-time
/// store and the feedback emitters
pub struct AppState {
    /// The elapsed-time state machine
    clock: Mutex<TimerClock>,
    /// Goal in minutes, read by every refresh evaluation
    goal_minutes: AtomicU64,
    /// Persisted best time plus the cached display value
    best_store: Box<dyn BestTimeStore>,
    best_display_ms: Mutex<Option<u64>>,
    /// Feedback emitters
    pub confetti: ConfettiField,
    chime: GoalChime,
    /// Monotonic reference all timer arithmetic is measured from
    epoch: tokio::time::Instant,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel for timer lifecycle notifications
    pub timer_event_tx: broadcast::Sender<TimerEvent>,
    /// Channel for snapshot updates
    pub snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl AppState {
    /// Create a new AppState. The goal is clamped to at least one minute.
    pub fn new(
        port: u16,
        host: String,
        goal_minutes: u64,
        best_store: Box<dyn BestTimeStore>,
        chime: GoalChime,
    ) -> Self {
        let goal_minutes = goal_minutes.max(1);
        let (timer_event_tx, _) = broadcast::channel(100);
        let (snapshot_tx, snapshot_rx) = watch::channel(TimerSnapshot::idle(goal_minutes));

        Self {
            clock: Mutex::new(TimerClock::new()),
            goal_minutes: AtomicU64::new(goal_minutes),
            best_store,
            best_display_ms: Mutex::new(None),
            confetti: ConfettiField::new(),
            chime,
            epoch: tokio::time::Instant::now(),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            timer_event_tx,
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    /// Monotonic milliseconds since process start.
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Load the persisted best once so the display has it from the start.
    pub fn init_best_display(&self) {
        if let Some(ms) = self.best_store.load() {
            if let Ok(mut display) = self.best_display_ms.lock() {
                *display = Some(ms);
            }
            info!("Loaded best time: {}", format_hms(ms));
        }
    }

    /// Start (or resume) the timer. Returns false when it was already
    /// running and nothing changed.
    pub fn start(&self) -> Result<bool, String> {
        let now = self.now_ms();
        let started = {
            let mut clock = self
                .clock
                .lock()
                .map_err(|e| format!("Failed to lock timer clock: {}", e))?;
            clock.start(now)
        };

        if started {
            info!("Timer started");
            self.track_action("start");
            self.publish_snapshot();
            if let Err(e) = self.timer_event_tx.send(TimerEvent::Started) {
                warn!("Failed to send timer start event: {}", e);
            }
        }
        Ok(started)
    }

    /// Pause the timer. Returns the folded elapsed time, or `None` when the
    /// timer was not running. A manual pause checks for a new best even when
    /// the goal was never reached.
    pub fn pause(&self) -> Result<Option<u64>, String> {
        let now = self.now_ms();
        let folded = {
            let mut clock = self
                .clock
                .lock()
                .map_err(|e| format!("Failed to lock timer clock: {}", e))?;
            clock.pause(now)
        };

        if let Some(elapsed) = folded {
            info!("Timer paused at {}", format_hms(elapsed));
            self.track_action("pause");
            self.publish_snapshot();
            if let Err(e) = self.timer_event_tx.send(TimerEvent::Stopped) {
                warn!("Failed to send timer stop event: {}", e);
            }
            self.record_best_if_beaten(elapsed);
        }
        Ok(folded)
    }

    /// Return to idle with zero elapsed time. Never touches the persisted
    /// best.
    pub fn reset(&self) -> Result<(), String> {
        {
            let mut clock = self
                .clock
                .lock()
                .map_err(|e| format!("Failed to lock timer clock: {}", e))?;
            clock.reset();
        }

        info!("Timer reset");
        self.track_action("reset");
        self.publish_snapshot();
        if let Err(e) = self.timer_event_tx.send(TimerEvent::Stopped) {
            warn!("Failed to send timer stop event: {}", e);
        }
        Ok(())
    }

    /// Reparse the goal input and apply it. Malformed input falls back to
    /// the default; a running timer is not interrupted, the new goal is
    /// picked up by the next refresh evaluation. Returns the effective goal.
    pub fn set_goal(&self, raw: &str) -> u64 {
        let minutes = parse_goal_minutes(raw);
        self.goal_minutes.store(minutes, Ordering::SeqCst);
        info!("Goal set to {} minutes", minutes);
        self.track_action("goal");
        self.publish_snapshot();
        minutes
    }

    pub fn goal_minutes(&self) -> u64 {
        self.goal_minutes.load(Ordering::SeqCst)
    }

    pub fn goal_ms(&self) -> u64 {
        self.goal_minutes() * 60_000
    }

    /// Check if the timer is currently running.
    pub fn is_running(&self) -> Result<bool, String> {
        self.clock
            .lock()
            .map(|clock| clock.is_running())
            .map_err(|e| format!("Failed to lock timer clock: {}", e))
    }

    /// Auto-pause bookkeeping for goal completion: when running and at or
    /// past the goal, fold the elapsed time and stop the clock. Returns the
    /// folded elapsed time when the goal fired. The caller owns the
    /// celebration and best-time check.
    pub fn complete_goal_if_due(&self, now_ms: u64) -> Result<Option<u64>, String> {
        let folded = {
            let mut clock = self
                .clock
                .lock()
                .map_err(|e| format!("Failed to lock timer clock: {}", e))?;
            if !clock.is_running() || clock.elapsed_ms(now_ms) < self.goal_ms() {
                None
            } else {
                clock.pause(now_ms)
            }
        };

        if let Some(elapsed) = folded {
            info!("Goal reached at {}", format_hms(elapsed));
            self.track_action("goal-reached");
            self.publish_snapshot();
            if let Err(e) = self.timer_event_tx.send(TimerEvent::Stopped) {
                warn!("Failed to send timer stop event: {}", e);
            }
        }
        Ok(folded)
    }

    /// Fire both feedback emitters.
    pub fn celebrate(&self) {
        self.chime.play();
        self.confetti.spawn_burst(CONFETTI_BURST_COUNT);
    }

    /// Persist `elapsed_ms` as the new best when it strictly exceeds the
    /// current record (absent counts as zero), refresh the display value and
    /// celebrate. Returns true when a new record was set.
    pub fn record_best_if_beaten(&self, elapsed_ms: u64) -> bool {
        let previous = self.best_store.load().unwrap_or(0);
        if elapsed_ms <= previous {
            return false;
        }

        if let Err(e) = self.best_store.save(elapsed_ms) {
            error!("Failed to persist best time: {}", e);
        }
        if let Ok(mut display) = self.best_display_ms.lock() {
            *display = Some(elapsed_ms);
        }
        info!("New best time: {}", format_hms(elapsed_ms));
        self.celebrate();
        self.publish_snapshot();
        true
    }

    /// Compute the current display snapshot.
    pub fn snapshot(&self) -> Result<TimerSnapshot, String> {
        let now = self.now_ms();
        let (running, elapsed_ms) = {
            let clock = self
                .clock
                .lock()
                .map_err(|e| format!("Failed to lock timer clock: {}", e))?;
            (clock.is_running(), clock.elapsed_ms(now))
        };
        let goal_minutes = self.goal_minutes();
        let best_ms = self.best_display_ms.lock().ok().and_then(|best| *best);

        Ok(TimerSnapshot {
            running,
            elapsed: format_hms(elapsed_ms),
            elapsed_ms,
            progress_percent: progress_percent(elapsed_ms, goal_minutes * 60_000),
            goal_minutes,
            best: best_ms.map(format_hms),
            best_ms,
            can_start: !running,
            can_pause: running,
        })
    }

    /// Send the current snapshot to watchers.
    pub fn publish_snapshot(&self) {
        match self.snapshot() {
            Ok(snapshot) => {
                if let Err(e) = self.snapshot_tx.send(snapshot) {
                    warn!("Failed to publish timer snapshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to compute timer snapshot: {}", e),
        }
    }

    fn track_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(goal_minutes: u64) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::new(
            0,
            "127.0.0.1".to_string(),
            goal_minutes,
            Box::new(crate::storage::MemoryBestStore::new()),
            GoalChime::disabled(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pause_when_idle_is_noop() {
        let state = AppState::for_tests(25);
        assert_eq!(state.pause().unwrap(), None);
        let (last_action, _) = state.get_last_action();
        assert_eq!(last_action, None);
    }

    #[tokio::test]
    async fn test_start_when_running_is_noop() {
        let state = AppState::for_tests(25);
        assert!(state.start().unwrap());
        assert!(!state.start().unwrap());
        assert!(state.is_running().unwrap());
    }

    #[tokio::test]
    async fn test_manual_pause_records_best() {
        let state = AppState::for_tests(25);
        state.start().unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let folded = state.pause().unwrap().expect("timer was running");
        assert!(folded > 0);

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.best_ms, Some(folded));
        assert_eq!(snapshot.best.as_deref(), Some(format_hms(folded).as_str()));
        assert_eq!(state.confetti.len(), CONFETTI_BURST_COUNT);
    }

    #[tokio::test]
    async fn test_best_time_is_monotone_max() {
        let state = AppState::for_tests(25);
        let mut expected = 0;
        for elapsed in [3000u64, 1000, 5000, 5000, 4000] {
            let recorded = state.record_best_if_beaten(elapsed);
            assert_eq!(recorded, elapsed > expected);
            expected = expected.max(elapsed);
            assert_eq!(state.snapshot().unwrap().best_ms, Some(expected));
        }
        assert_eq!(state.snapshot().unwrap().best_ms, Some(5000));
    }

    #[tokio::test]
    async fn test_pause_below_best_does_not_celebrate() {
        let state = AppState::for_tests(25);
        assert!(state.record_best_if_beaten(600_000));
        let bursts_after_record = state.confetti.len();

        state.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        state.pause().unwrap().expect("timer was running");

        assert_eq!(state.confetti.len(), bursts_after_record);
        assert_eq!(state.snapshot().unwrap().best_ms, Some(600_000));
    }

    #[tokio::test]
    async fn test_reset_zeroes_display_but_keeps_best() {
        let state = AppState::for_tests(25);
        assert!(state.record_best_if_beaten(2000));

        state.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        state.reset().unwrap();

        let snapshot = state.snapshot().unwrap();
        assert!(!snapshot.running);
        assert_eq!(snapshot.elapsed, "00:00:00");
        assert_eq!(snapshot.elapsed_ms, 0);
        assert_eq!(snapshot.progress_percent, 0.0);
        assert!(snapshot.can_start);
        assert!(!snapshot.can_pause);
        assert_eq!(snapshot.best_ms, Some(2000));
    }

    #[tokio::test]
    async fn test_set_goal_parses_and_clamps() {
        let state = AppState::for_tests(25);
        assert_eq!(state.set_goal("40"), 40);
        assert_eq!(state.snapshot().unwrap().goal_minutes, 40);
        assert_eq!(state.set_goal("0"), 1);
        assert_eq!(state.set_goal(""), 25);
        assert_eq!(state.set_goal("soon"), 25);
    }

    #[tokio::test]
    async fn test_complete_goal_only_fires_past_threshold() {
        let state = AppState::for_tests(1);
        state.start().unwrap();

        let before = state.now_ms();
        assert_eq!(state.complete_goal_if_due(before).unwrap(), None);
        assert!(state.is_running().unwrap());

        let folded = state
            .complete_goal_if_due(before + 60_000)
            .unwrap()
            .expect("goal was due");
        assert!(folded >= 60_000);
        assert!(!state.is_running().unwrap());

        // Already idle: a second evaluation is a no-op.
        assert_eq!(state.complete_goal_if_due(before + 61_000).unwrap(), None);
    }
}
