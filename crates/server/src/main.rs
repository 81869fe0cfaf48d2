mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slateforge_core::{
    create_audit_system, load_config, validate_config, AuditStore, Config, HttpDispatcher,
    PipelineEvent, PipelineOrchestrator, SlateStore, SqliteAuditStore, SqliteSlateStore,
    SqliteStageQueue, StageQueue, TaskDispatcher,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let explicit_config = std::env::var("SLATEFORGE_CONFIG").map(PathBuf::from).ok();
    let config_path = explicit_config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    // Load configuration; a missing default file falls back to defaults, a
    // missing explicit file is an error.
    let config: Config = if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else if explicit_config.is_some() {
        anyhow::bail!("Config file not found: {:?}", config_path);
    } else {
        info!("No config file found, using defaults");
        Config::default()
    };

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Task service: {}", config.dispatcher.api_base);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create SQLite audit store
    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    // Create SQLite slate store
    let store: Arc<dyn SlateStore> = Arc::new(
        SqliteSlateStore::new(&config.database.path).context("Failed to create slate store")?,
    );
    info!("Slate store initialized");

    // Create SQLite stage queue
    let queue: Arc<dyn StageQueue> = Arc::new(
        SqliteStageQueue::new(&config.database.path).context("Failed to create stage queue")?,
    );
    info!("Stage queue initialized");

    // Create audit system
    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);

    // Spawn audit writer task
    let writer_handle = tokio::spawn(audit_writer.run());

    // Emit ServiceStarted event
    audit_handle
        .emit(PipelineEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    // Create the task dispatcher
    let mut dispatcher = HttpDispatcher::new(config.dispatcher.api_base.clone())
        .with_timeout(Duration::from_secs(config.dispatcher.timeout_secs));
    if let Some(ref api_key) = config.dispatcher.api_key {
        dispatcher = dispatcher.with_api_key(api_key.clone());
    }
    let dispatcher: Arc<dyn TaskDispatcher> = Arc::new(dispatcher);

    // Create the pipeline orchestrator
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        config.pipeline.clone(),
        Arc::clone(&store),
        Arc::clone(&queue),
        dispatcher,
        Some(audit_handle.clone()),
    ));

    if config.pipeline.enabled {
        orchestrator.start().await;
        info!("Stage worker started");
    } else {
        info!("Stage worker disabled in config");
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::clone(&orchestrator),
        audit_store,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the stage worker
    info!("Stopping stage worker...");
    orchestrator.stop().await;
    info!("Stage worker stopped");

    // Emit ServiceStopped event
    info!("Server shutting down...");
    audit_handle
        .emit(PipelineEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Drop all holders of AuditHandle so the writer's channel closes.
    // The orchestrator holds an AuditHandle clone, so we must drop it.
    // Order matters: we emit the final event BEFORE dropping handles.
    drop(orchestrator);
    drop(audit_handle);

    // Wait for writer to finish processing remaining events
    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
