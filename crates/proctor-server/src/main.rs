//! Service binary for the Proctor exam timer.
//!
//! This is the main entry point that wires together the Redis room
//! store, the distributed room lock, the NATS event bus, the room
//! coordinator, and the WebSocket gateway. It loads configuration,
//! connects all backends, and serves until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `proctor-config.yaml`
//! 3. Connect to Redis and NATS, assemble the coordinator
//! 4. Create the gateway fanout state
//! 5. Start the bus-to-client event pump
//! 6. Serve the WebSocket gateway until Ctrl-C

mod config;
mod context;
mod error;

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt as _;
use proctor_bus::NatsBus;
use proctor_gateway::server::{start_server, ServerConfig};
use proctor_gateway::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ProctorConfig;
use crate::context::AppContext;
use crate::error::ServiceError;

/// Application entry point for the Proctor service.
///
/// Initializes all subsystems and serves until interrupted. Returns
/// an error code on failure.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("proctor-server starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        tick_interval_ms = config.timer.tick_interval_ms,
        lock_ttl_ms = config.lock.ttl_ms,
        "Configuration loaded"
    );

    // 3. Connect backends and assemble the coordinator.
    let context = AppContext::connect(&config).await?;
    info!("Backends connected, coordinator assembled");

    // 4. Create the gateway fanout state.
    let state = Arc::new(AppState::new(Arc::clone(context.coordinator())));

    // 5. Start the bus-to-client event pump. Every instance relays
    //    the full event stream, so clients see updates regardless of
    //    which instance mutated the room.
    spawn_event_pump(&context, &state).await?;
    info!("Event pump started");

    // 6. Serve the gateway until Ctrl-C.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    tokio::select! {
        result = start_server(&server_config, Arc::clone(&state)) => {
            result.map_err(ServiceError::from)?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
    }

    context.shutdown().await;
    info!("proctor-server shutdown complete");

    Ok(())
}

/// Load the service configuration from `proctor-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<ProctorConfig, ServiceError> {
    let config_path = Path::new("proctor-config.yaml");
    if config_path.exists() {
        let config = ProctorConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(ProctorConfig::default())
    }
}

/// Subscribe to the room event stream and relay every event into the
/// gateway fanout.
///
/// Decode failures are logged and skipped; the stream is at-least-once
/// and every event carries a full room snapshot, so a dropped message
/// is corrected by the next one.
async fn spawn_event_pump(
    context: &AppContext,
    state: &Arc<AppState>,
) -> Result<(), ServiceError> {
    let mut subscriber = context.bus().subscribe_events().await?;
    let pump_state = Arc::clone(state);

    tokio::spawn(async move {
        while let Some(message) = subscriber.next().await {
            match NatsBus::deserialize_event(&message.payload) {
                Ok(event) => {
                    pump_state.fanout(&event).await;
                }
                Err(e) => {
                    warn!(error = %e, subject = %message.subject, "failed to deserialize room event");
                }
            }
        }
        warn!("room event subscription ended");
    });

    Ok(())
}
