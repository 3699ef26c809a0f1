//! Chrono Goal - A state-managed HTTP server for goal-driven focus timing
//!
//! This is the main entry point for the chrono-goal application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use chrono_goal::{
    api::create_router,
    config::Config,
    services::GoalChime,
    state::AppState,
    storage::FileBestStore,
    tasks::{control_signals_task, refresh_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "chrono_goal={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting chrono-goal server v0.1.0");
    info!(
        "Configuration: host={}, port={}, goal={}min",
        config.host, config.port, config.goal
    );

    // Probe the audio pathway once; the chime stays best-effort
    let chime = GoalChime::start();
    if !chime.is_enabled() {
        warn!("Audio output unavailable, goal chime disabled");
    }

    // Open the best-time store
    let store = match &config.data_dir {
        Some(dir) => FileBestStore::new(dir.clone())?,
        None => FileBestStore::at_default_location()?,
    };
    info!("Best time persisted at {}", store.path().display());

    // Create application state and preload the best-time display
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.goal,
        Box::new(store),
        chime,
    ));
    state.init_best_display();

    // Start the refresh and control-signal background tasks
    let refresh_state = Arc::clone(&state);
    tokio::spawn(async move {
        refresh_task(refresh_state).await;
    });
    let signals_state = Arc::clone(&state);
    tokio::spawn(async move {
        control_signals_task(signals_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start  - Start or resume the timer");
    info!("  POST /pause  - Pause and check for a new best time");
    info!("  POST /reset  - Zero the timer");
    info!("  POST /goal   - Set the goal in minutes");
    info!("  GET  /status - Timer snapshot, best time and confetti");
    info!("  GET  /health - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
