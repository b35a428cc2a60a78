//! Egg Timer - A countdown timer engine with an HTTP control surface
//!
//! This is the main entry point for the egg-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use egg_timer::{
    api::create_router,
    config::Config,
    services::{Alarm, PreferenceStore},
    state::AppState,
    tasks::{completion_alarm_task, preference_sync_task},
    timer::TimerEngine,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("egg_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting egg-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, prefs={}",
        config.host,
        config.port,
        config.prefs.display()
    );

    // Load the preferred timer length (defaults when the file is missing)
    let preferences = PreferenceStore::load(&config.prefs).await?;
    let engine = TimerEngine::new(preferences.get().selected_time_secs)?;

    // Create application state
    let state = Arc::new(AppState::new(
        engine,
        preferences,
        config.port,
        config.host.clone(),
    ));

    // Start the background tasks
    let prefs_state = Arc::clone(&state);
    tokio::spawn(async move {
        preference_sync_task(prefs_state).await;
    });

    let alarm = match &config.sound {
        Some(sound) => Alarm::new(config.player.clone(), Some(sound.clone())),
        None => Alarm::disabled(),
    };
    let alarm_state = Arc::clone(&state);
    tokio::spawn(async move {
        completion_alarm_task(alarm_state, alarm).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start  - Start the timer, or resume it if paused");
    info!("  POST /timer/pause  - Pause a running timer");
    info!("  POST /timer/resume - Resume a paused timer");
    info!("  POST /timer/stop   - Stop the timer and re-arm it");
    info!("  POST /timer/reset  - Reset the timer to idle");
    info!("  GET  /preferences  - Show the selected timer length");
    info!("  PUT  /preferences  - Change the selected timer length");
    info!("  GET  /status       - Check timer state and display");
    info!("  GET  /health       - Health check");

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
