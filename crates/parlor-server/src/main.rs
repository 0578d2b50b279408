//! Server binary for the Parlor chat room.
//!
//! This is the main entry point that wires together the document store,
//! the chat service, the inactivity sweeper, and the HTTP API. It loads
//! configuration, opens the store, and serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `parlor-config.yaml` (or `PARLOR_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the document store (running migrations for `PostgreSQL`)
//! 4. Build the chat service and start the inactivity sweeper
//! 5. Serve HTTP until `Ctrl-C`
//! 6. Stop the sweeper and close the store

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use parlor_api::{AppState, ServerConfig};
use parlor_core::{ChatConfig, ChatService, StorageBackend, SystemClock};
use parlor_core::config::{LoggingConfig, StorageConfig};
use parlor_db::{ChatStore, DbError, MemoryStore, PostgresConfig, PostgresPool};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::LaunchError;

/// Name of the configuration file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "parlor-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the server fails.
#[tokio::main]
async fn main() -> Result<(), LaunchError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        host = config.server.host,
        port = config.server.port,
        backend = ?config.storage.backend,
        inactivity_threshold_ms = config.presence.inactivity_threshold_ms,
        sweep_interval_ms = config.presence.sweep_interval_ms,
        "parlor-server starting"
    );

    // 3. Open the document store.
    let store = open_store(&config.storage).await?;

    // 4. Build the service and start sweeping.
    let service = ChatService::new(
        Arc::clone(&store),
        Arc::new(SystemClock::new()),
        &config.presence,
    )?;
    let sweeper = service.spawn_sweeper();

    // 5. Serve until Ctrl-C.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let state = Arc::new(AppState::new(service.clone()));
    let served = parlor_api::start_server(&server_config, state, shutdown_signal()).await;

    // 6. Tear down in reverse order, even if serving failed.
    sweeper.shutdown().await;
    service.close().await;

    match served {
        Ok(()) => {
            info!("parlor-server stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "HTTP server failed");
            Err(e.into())
        }
    }
}

/// Load configuration from `PARLOR_CONFIG` or `parlor-config.yaml`.
///
/// A missing file is not an error: defaults are used, still subject to
/// environment overrides.
fn load_config() -> Result<ChatConfig, LaunchError> {
    let path = std::env::var_os("PARLOR_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
    if path.exists() {
        Ok(ChatConfig::from_file(&path)?)
    } else {
        Ok(ChatConfig::parse("")?)
    }
}

/// Install the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), LaunchError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| LaunchError::Logging {
        message: e.to_string(),
    })
}

/// Open the configured store backend.
async fn open_store(storage: &StorageConfig) -> Result<Arc<dyn ChatStore>, LaunchError> {
    match storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let url = storage
                .database_url
                .as_deref()
                .ok_or_else(|| DbError::Config("database_url is not set".to_owned()))?;
            let pool = PostgresPool::connect(&pool_config(url, storage)).await?;
            pool.run_migrations().await?;
            info!(
                max_connections = storage.max_connections,
                connect_timeout_secs = storage.connect_timeout_secs,
                idle_timeout_secs = storage.idle_timeout_secs,
                "PostgreSQL store ready"
            );
            Ok(Arc::new(pool))
        }
    }
}

/// Pool settings for the postgres backend.
fn pool_config(url: &str, storage: &StorageConfig) -> PostgresConfig {
    PostgresConfig::new(url)
        .with_max_connections(storage.max_connections)
        .with_connect_timeout(storage.connect_timeout())
        .with_idle_timeout(storage.idle_timeout())
}

/// Resolve on `Ctrl-C`. If the signal handler cannot be installed the
/// server keeps running until the process is killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
