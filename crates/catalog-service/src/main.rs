//! Catalog service binary.
//!
//! Startup flow:
//! 1. Load configuration from environment
//! 2. Connect to Postgres behind a bounded-retry connectivity probe -
//!    probe exhaustion fails startup
//! 3. Build the identity bridge client for the auth service's internal
//!    listener
//! 4. Start the HTTP listener
//! 5. Wait for shutdown signal (Ctrl+C / SIGTERM)

#![warn(clippy::pedantic)]

use catalog_service::config::Config;
use catalog_service::handlers::AppState;
use catalog_service::repositories;
use catalog_service::routes;
use catalog_service::services::identity_client::IdentityClient;
use common::middleware::IdentityResolver;
use common::secret::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Catalog Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        auth_internal_url = %config.auth_internal_url,
        connect_retries = config.connect_retries,
        "Configuration loaded successfully"
    );

    // Connect to Postgres (bounded-retry probe inside)
    info!("Connecting to Postgres...");
    let pool = repositories::connect(config.database_url.expose_secret(), config.connect_retries)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to Postgres");
            e
        })?;
    info!("Postgres connection established");

    let resolver: Arc<dyn IdentityResolver> =
        Arc::new(IdentityClient::new(config.auth_internal_url.clone()).map_err(|e| {
            error!(error = %e, "Failed to build identity bridge client");
            e
        })?);

    let app = routes::routes(AppState { pool }, resolver);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(bind_address = %config.bind_address, "Invalid bind address");
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(addr = %addr, error = %e, "Failed to bind listener");
        e
    })?;

    info!(addr = %addr, "Catalog Service running - press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            e
        })?;

    info!("Catalog Service shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable because
/// without signal handlers, we cannot gracefully shut down the service.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown signal received, initiating graceful shutdown...");
}
