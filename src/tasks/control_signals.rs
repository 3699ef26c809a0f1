//! Control-signal shortcuts
//!
//! The daemon analog of global keyboard shortcuts: SIGUSR1 toggles
//! start/pause and SIGUSR2 resets, independent of any client being
//! connected.

use std::sync::Arc;

use futures::stream::StreamExt;
use signal_hook::consts::{SIGUSR1, SIGUSR2};
use signal_hook_tokio::Signals;
use tracing::{debug, error, info};

use crate::state::AppState;

/// Background task that maps process signals to timer transitions
pub async fn control_signals_task(state: Arc<AppState>) {
    let mut signals = match Signals::new([SIGUSR1, SIGUSR2]) {
        Ok(signals) => signals,
        Err(e) => {
            error!("Failed to register control signals: {}", e);
            return;
        }
    };
    info!("Control signals ready: SIGUSR1 toggles start/pause, SIGUSR2 resets");

    while let Some(signal) = signals.next().await {
        debug!("Received control signal: {}", signal);
        let outcome = match signal {
            SIGUSR1 => match state.is_running() {
                Ok(true) => state.pause().map(|_| ()),
                Ok(false) => state.start().map(|_| ()),
                Err(e) => Err(e),
            },
            SIGUSR2 => state.reset(),
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            error!("Failed to apply control signal {}: {}", signal, e);
        }
    }
}
