//! Class booking HTTP server.
//!
//! Capacity-gated reservations for studio class sessions, backed by Postgres.

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use studio_booking_core::{BookingService, metrics::register_booking_metrics};
use studio_booking_postgres::PostgresBookingStore;
use studio_booking_server::{config::Config, probe::DatabaseProbe};
use studio_booking_web::{AppState, build_router};
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.server.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booking server");
    info!(
        database = %config.postgres.redacted_url(),
        max_connections = config.postgres.max_connections,
        "Configuration loaded"
    );

    // Prometheus exporter
    let metrics_addr: SocketAddr = config
        .server
        .metrics_addr()
        .parse()
        .context("invalid METRICS_HOST/METRICS_PORT")?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    register_booking_metrics();
    info!(address = %metrics_addr, "Metrics exporter listening");

    // Database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(config.postgres.connect_timeout())
        .idle_timeout(config.postgres.idle_timeout())
        .connect(&config.postgres.url)
        .await
        .context("failed to connect to database")?;
    let store = PostgresBookingStore::new(pool.clone());
    store.migrate().await.context("failed to run migrations")?;
    info!("Database ready");

    let service = BookingService::new(Arc::new(store));
    let state = AppState::new(service).with_probes(vec![Arc::new(DatabaseProbe::new(pool))]);
    let app = build_router(state);

    let addr = config.server.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    // Run server with graceful shutdown, bounded by SHUTDOWN_TIMEOUT
    let shutdown = Arc::new(Notify::new());
    let trigger = Arc::clone(&shutdown);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { trigger.notified().await })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        () = shutdown_signal() => {
            shutdown.notify_one();
            let drain = config.server.shutdown_timeout();
            match tokio::time::timeout(drain, &mut server).await {
                Ok(result) => result?,
                Err(_) => warn!(timeout_secs = drain.as_secs(), "Shutdown timed out with requests in flight"),
            }
        },
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
