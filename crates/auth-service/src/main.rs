//! Auth service binary.
//!
//! Startup flow:
//! 1. Load configuration from environment
//! 2. Connect to Postgres (profiles) and Redis (sessions), each behind a
//!    bounded-retry connectivity probe - probe exhaustion fails startup
//! 3. Build the authorization core around both stores
//! 4. Start the public HTTP listener and the internal identity bridge
//!    listener concurrently; the first fatal error from either wins and
//!    terminates the process
//! 5. Wait for shutdown signal (Ctrl+C / SIGTERM)

#![warn(clippy::pedantic)]

use auth_service::config::Config;
use auth_service::handlers::auth_handler::AppState;
use auth_service::repositories::profiles::PgProfileStore;
use auth_service::repositories::sessions::RedisSessionStore;
use auth_service::routes;
use auth_service::services::core::AuthCore;
use common::secret::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Auth Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        internal_bind_address = %config.internal_bind_address,
        connect_retries = config.connect_retries,
        "Configuration loaded successfully"
    );

    // Connect to Postgres (bounded-retry probe inside)
    info!("Connecting to Postgres...");
    let profiles = PgProfileStore::connect(
        config.database_url.expose_secret(),
        config.connect_retries,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to connect to Postgres");
        e
    })?;
    info!("Postgres connection established");

    // Connect to Redis (bounded-retry probe inside)
    info!("Connecting to Redis...");
    let sessions = RedisSessionStore::connect(config.redis_url.expose_secret(), config.connect_retries)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to Redis");
            e
        })?;
    info!("Redis connection established");

    let core = Arc::new(AuthCore::new(
        Arc::new(profiles),
        Box::new(sessions),
        config.bcrypt_cost,
    ));
    let state = AppState { core };

    let shutdown_token = CancellationToken::new();

    // Both listeners report fatal errors into a bounded channel; the first
    // received error terminates the process, the second send is
    // best-effort and may be dropped.
    let (error_tx, mut error_rx) = mpsc::channel::<String>(2);

    spawn_listener(
        "public",
        &config.bind_address,
        routes::public_routes(state.clone()),
        error_tx.clone(),
        shutdown_token.child_token(),
    );

    spawn_listener(
        "internal",
        &config.internal_bind_address,
        routes::internal_routes(state),
        error_tx,
        shutdown_token.child_token(),
    );

    info!("Auth Service running - press Ctrl+C to shutdown");

    tokio::select! {
        Some(listener_error) = error_rx.recv() => {
            error!(error = %listener_error, "Listener failed, shutting down");
            shutdown_token.cancel();
            return Err(listener_error.into());
        }
        () = shutdown_signal() => {
            info!("Shutdown signal received, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();

    info!("Auth Service shutdown complete");
    Ok(())
}

/// Bind and serve a router on its own task.
///
/// Bind and serve failures both land in `errors`; `try_send` keeps the
/// reporting non-blocking when the channel is already carrying the
/// first (winning) error.
fn spawn_listener(
    name: &'static str,
    bind_address: &str,
    app: axum::Router,
    errors: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    let bind_address = bind_address.to_string();

    tokio::spawn(async move {
        let addr: SocketAddr = match bind_address.parse() {
            Ok(addr) => addr,
            Err(e) => {
                let _ = errors.try_send(format!("{name}: invalid bind address {bind_address}: {e}"));
                return;
            }
        };

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                let _ = errors.try_send(format!("{name}: failed to bind {addr}: {e}"));
                return;
            }
        };

        info!(listener = name, addr = %addr, "Listener started");

        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            cancel.cancelled().await;
            info!(listener = name, "Listener shutting down");
        });

        if let Err(e) = server.await {
            let _ = errors.try_send(format!("{name}: server error: {e}"));
        }
    });
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
}
