//! reefscan-api - Detection reconciliation service
//!
//! Accepts one image per request, compares the static baseline detections
//! with a Gemini classification, records and returns the reconciled result.

use anyhow::{Context, Result};
use clap::Parser;
use reefscan_api::config::{Args, ServiceConfig};
use reefscan_api::{build_router, AppState};
use reefscan_common::config::{load_toml_config_or_default, CompiledDefaults};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read before tracing is up so the TOML log level can apply
    let toml_config = load_toml_config_or_default(args.config.as_deref());
    let log_level = toml_config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| CompiledDefaults::default().log_level);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "reefscan_api={0},reefscan_common={0},tower_http={0}",
                log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting reefscan-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = toml_config.context("Failed to load config file")?;
    let config = ServiceConfig::resolve(&args, &toml_config).context("Invalid configuration")?;

    info!("Gemini model: {}", config.gemini_model);
    info!(
        "Upload limits: {} bytes, types [{}]",
        config.limits.max_upload_bytes,
        config.limits.allowed_media_types.join(", ")
    );
    match &config.client_origin {
        Some(origin) => info!("CORS: allowing {}", origin),
        None => info!("CORS: allowing any origin"),
    }

    let state = AppState::from_config(&config).context("Failed to initialize services")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_address()))?;
    info!("Listening on http://{}", config.listen_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
