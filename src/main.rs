//! NoteGraph Server: personal knowledge base with hot-pluggable extensions.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use notegraph_api::{AppState, build_app};
use notegraph_core::config::AppConfig;
use notegraph_core::error::AppError;
use notegraph_notes::{FsNoteStore, NoteLinkGraphSource};
use notegraph_plugin::{ExtensionCatalog, HostServices, PluginManager};

#[tokio::main]
async fn main() {
    let env = std::env::var("NOTEGRAPH_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Compiled-in extension factories, selected by manifests.
fn catalog() -> ExtensionCatalog {
    let mut catalog = ExtensionCatalog::new();
    catalog.register(plugin_enhanced_graph::FACTORY_NAME, plugin_enhanced_graph::factory);
    catalog
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting NoteGraph v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Note store ───────────────────────────────────────
    let store = Arc::new(FsNoteStore::new(&config.notes));
    store.ensure_root().await?;
    tokio::fs::create_dir_all(&config.plugins.directory)
        .await
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create plugin directory '{}': {e}",
                config.plugins.directory
            ))
        })?;

    // ── Step 2: Extension runtime ────────────────────────────────
    let services = HostServices {
        link_graph: Arc::new(NoteLinkGraphSource::new(Arc::clone(&store))),
    };
    let plugins = Arc::new(PluginManager::new(&config.plugins, catalog(), services));
    plugins.bootstrap().await?;

    // ── Step 3: HTTP server ──────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_app(AppState::new(config, store, plugins));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("NoteGraph server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("NoteGraph server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
