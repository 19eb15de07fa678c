mod api;
mod clock;
mod command;
mod config;
mod connectivity;
mod controller;
mod devices;
mod events;
mod link;
mod update;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use api::ApiState;
use clock::{Clock, TokioClock};
use command::{ActionTable, CommandDispatcher};
use config::{LinkMode, NodeConfig};
use connectivity::ConnectivitySupervisor;
use controller::Controller;
use devices::SimulatedBoard;
use events::{EventSink, TracingSink};
use link::{NetworkLink, SimulatedLink, TcpProbeLink};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use update::{OtaReceiver, UpdateLifecycleManager, UploadSettings};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Requests beyond this wait in their HTTP handlers
const COMMAND_QUEUE_DEPTH: usize = 1;

const UPDATE_QUEUE_DEPTH: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = NodeConfig::resolve_path(std::env::args().nth(1));
    let (config, found) = match NodeConfig::load(&config_path)? {
        Some(config) => (config, true),
        None => (NodeConfig::default(), false),
    };

    // Initialize tracing
    let level: tracing::Level = config.log.level.into();
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if !found {
        warn!("Config file {} not found, using defaults", config_path.display());
    }

    info!("Smart home node starting: {}", config.device_id);
    info!("  Firmware: {} (rollback {})", config.firmware.version, config.firmware.enable_rollback);

    let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
    let sink: Arc<dyn EventSink> = Arc::new(TracingSink);
    let version = Arc::new(config.version_info());

    let link: Box<dyn NetworkLink> = match config.network.mode {
        LinkMode::Simulated => Box::new(SimulatedLink::new(config.simulation.associate_after)),
        LinkMode::Tcp => {
            info!("  Gateway: {}", config.network.gateway);
            Box::new(TcpProbeLink::new(
                config.network.gateway.clone(),
                config.connect_timeout(),
            ))
        }
    };

    let supervisor = ConnectivitySupervisor::new(
        link,
        config.credentials(),
        config.retry_policy(),
        clock.clone(),
        sink.clone(),
    );
    let board = SimulatedBoard::new(config.simulation.temperature, config.simulation.humidity);
    let dispatcher =
        CommandDispatcher::new(ActionTable::standard()?, board, clock.clone(), sink.clone());
    let updates = UpdateLifecycleManager::new(version.clone(), sink.clone());

    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let (update_tx, update_rx) = mpsc::channel(UPDATE_QUEUE_DEPTH);

    // HTTP API
    let listener = TcpListener::bind(config.server.addr())
        .await
        .with_context(|| format!("Failed to bind HTTP API on {}", config.server.addr()))?;
    let api_state = ApiState::new(command_tx, version);
    tokio::spawn(async move {
        if let Err(e) = api::serve(listener, api_state).await {
            error!("{:#}", e);
        }
    });

    // OTA receiver
    if config.ota.enabled {
        tokio::fs::create_dir_all(&config.ota.staging_dir)
            .await
            .with_context(|| {
                format!("Failed to create {}", config.ota.staging_dir.display())
            })?;

        let ota_addr = format!("{}:{}", config.server.bind, config.ota.port);
        let settings = UploadSettings {
            password: config.ota.password.clone(),
            staging_dir: config.ota.staging_dir.clone(),
            receive_timeout: config.receive_timeout(),
        };
        let receiver = OtaReceiver::bind(&ota_addr, settings, update_tx).await?;
        info!("OTA ready: {}.local:{}", config.ota.hostname, config.ota.port);

        tokio::spawn(async move {
            if let Err(e) = receiver.run().await {
                error!("OTA receiver stopped: {:#}", e);
            }
        });
    } else {
        drop(update_tx);
        info!("OTA disabled");
    }

    let controller = Controller::new(
        supervisor,
        dispatcher,
        updates,
        update_rx,
        command_rx,
        config.loop_interval(),
    );

    tokio::select! {
        _ = controller.run() => {
            warn!("Control loop exited");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
