//! Display refresh background task
//!
//! The daemon's stand-in for a frame-driven UI loop: while the timer runs,
//! a ticker recomputes the snapshot, publishes it to watchers and checks
//! the goal threshold. Transitions out of the running state cancel the
//! cycle through the timer event channel, so a stale tick can never fire
//! after the state has moved on.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::state::{AppState, TimerEvent};

/// Cadence of the refresh cycle while the timer runs.
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// Background task that drives the refresh cycle and goal detection
pub async fn refresh_task(state: Arc<AppState>) {
    info!("Starting display refresh task");

    let mut events = state.timer_event_tx.subscribe();

    loop {
        match events.recv().await {
            Ok(TimerEvent::Started) => {
                debug!("Timer running, entering refresh cycle");
                let mut ticker = tokio::time::interval(REFRESH_INTERVAL);

                loop {
                    tokio::select! {
                        // Refresh tick - republish the snapshot and check the goal
                        _ = ticker.tick() => {
                            let now = state.now_ms();
                            match state.complete_goal_if_due(now) {
                                Ok(Some(elapsed)) => {
                                    info!("Goal reached, firing celebration");
                                    state.celebrate();
                                    state.record_best_if_beaten(elapsed);
                                    break;
                                }
                                Ok(None) => state.publish_snapshot(),
                                Err(e) => error!("Failed to evaluate goal condition: {}", e),
                            }
                        }

                        // Timer event - cancel the cycle once the timer stops
                        Ok(event) = events.recv() => {
                            if event == TimerEvent::Stopped {
                                debug!("Timer stopped, cancelling refresh cycle");
                                break;
                            }
                        }
                    }
                }
            }
            Ok(TimerEvent::Stopped) => {
                debug!("Timer idle, no refresh cycle pending");
            }
            Err(e) => {
                error!("Error receiving timer event: {}", e);
                // Wait a bit before retrying
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
