//! Gavel - Auction lifecycle daemon
//!
//! Wires the SQLite auction collection, the closing scheduler and the
//! JSON-RPC server together, then waits for Ctrl+C.

mod config;
mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

use config::{DaemonConfig, LogFormat};
use telemetry::TelemetryStatus;
use gavel_api_rpc::{RpcServer, RpcServerConfig};
use gavel_core::application::{
    shutdown_channel, AuctionStore, ClosingScheduler, ClosureEvent, DurationResolver,
};
use gavel_core::port::id_provider::UuidProvider;
use gavel_core::port::time_provider::SystemTimeProvider;
use gavel_core::port::EnvConfigSource;
use gavel_infra_sqlite::{create_pool, run_migrations, SqliteAuctionCollection};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let env = Arc::new(EnvConfigSource);
    let config = DaemonConfig::from_source(env.as_ref());

    // 2. Initialize logging (with optional OTLP span export)
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("gavel=info"))?;

    let (otel_layer, telemetry_status) = match telemetry::layer::<Registry>(&config) {
        Ok(built) => built,
        Err(e) => (None, TelemetryStatus::Failed(e.to_string())),
    };

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(otel_layer)
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(otel_layer)
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Gavel v{} starting...", gavel_core::VERSION);

    match telemetry_status {
        TelemetryStatus::Disabled => {
            debug!("OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)")
        }
        TelemetryStatus::Unsupported => {
            warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled")
        }
        TelemetryStatus::Exporting {
            endpoint,
            service_name,
        } => info!(endpoint = %endpoint, service_name = %service_name, "OpenTelemetry initialized"),
        TelemetryStatus::Failed(e) => {
            warn!(error = %e, "Failed to initialize OpenTelemetry (continuing without it)")
        }
    }

    // 3. Initialize database
    info!(db_path = %config.db_path, "Initializing database...");
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = create_pool(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let collection = Arc::new(SqliteAuctionCollection::new(
        pool.clone(),
        Arc::new(UuidProvider),
    ));
    let resolver = DurationResolver::new(env);

    let (scheduler, closer) =
        ClosingScheduler::new(collection.clone(), resolver, time_provider.clone());
    let mut closure_events = closer.subscribe();
    let store = Arc::new(AuctionStore::new(collection, closer));

    // 5. Start closing scheduler
    info!("Starting closing scheduler...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(shutdown_rx).await {
            error!(error = ?e, "Closing scheduler failed");
        }
    });

    tokio::spawn(async move {
        loop {
            match closure_events.recv().await {
                Ok(ClosureEvent::Failed { auction_id, reason }) => {
                    warn!(auction_id = %auction_id, reason = %reason, "Auction left active");
                }
                Ok(event) => {
                    debug!(auction_id = %event.auction_id(), ?event, "Closure outcome");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "Closure event listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 6. Start JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
    };
    let rpc_handle = RpcServer::new(rpc_config, store, time_provider)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: pending closures are abandoned
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    shutdown_tx.shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, scheduler_handle)
        .await
        .is_err()
    {
        warn!("Closing scheduler did not stop within the grace period");
    }
    pool.close().await;
    telemetry::shutdown();

    info!("Shutdown complete.");

    Ok(())
}
