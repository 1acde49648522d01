use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitals_api::background::{join_monitor, VitalsMonitor};
use vitals_api::config::{MonitorConfig, ServerConfig, StoreBackend};
use vitals_api::router::build_app;
use vitals_api::snapshot::SnapshotStore;
use vitals_api::state::AppState;
use vitals_events::{Notifier, SmsConfig, SmsDelivery};
use vitals_store::{AlertSink, MemorySink, MemorySource, MetricSource, RealtimeDatabase};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitals_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let monitor_config = MonitorConfig::from_env();
    tracing::info!(
        poll_interval_secs = monitor_config.poll_interval_secs,
        alert_collection = %monitor_config.alert_collection,
        thresholds = ?monitor_config.thresholds,
        "Loaded monitor configuration"
    );

    // --- Stores ---
    let (source, sink) = build_stores(&monitor_config);

    // --- Notifications ---
    let notifier: Option<Arc<dyn Notifier>> = match SmsConfig::from_env() {
        Some(sms_config) => {
            let delivery: Arc<dyn Notifier> = Arc::new(
                SmsDelivery::new(sms_config).expect("Failed to build SMS HTTP client"),
            );
            tracing::info!("SMS notifications enabled");
            Some(delivery)
        }
        None => {
            tracing::info!("SMS notifications disabled");
            None
        }
    };

    // --- Vitals monitor ---
    let snapshot = Arc::new(SnapshotStore::new());
    let mut monitor = VitalsMonitor::new(
        source,
        sink,
        Arc::clone(&snapshot),
        monitor_config.thresholds.clone(),
    )
    .with_poll_interval(Duration::from_secs(monitor_config.poll_interval_secs))
    .with_fetch_timeout(Duration::from_secs(monitor_config.fetch_timeout_secs));
    if let Some(notifier) = notifier {
        monitor = monitor.with_notifier(notifier);
    }

    let monitor_cancel = CancellationToken::new();
    let monitor_handle = monitor.spawn(monitor_cancel.clone());

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        snapshot,
    };
    let app = build_app(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    monitor_cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    join_monitor(monitor_handle, shutdown_timeout).await;

    tracing::info!("Graceful shutdown complete");
}

/// Build the reading source and alert sink for the configured backend.
fn build_stores(config: &MonitorConfig) -> (Arc<dyn MetricSource>, Arc<dyn AlertSink>) {
    match &config.store {
        StoreBackend::Firebase {
            database_url,
            auth_token,
        } => {
            let db = RealtimeDatabase::new(database_url.clone(), auth_token.clone())
                .expect("Failed to build Firebase HTTP client");
            tracing::info!(
                %database_url,
                authenticated = auth_token.is_some(),
                "Using Firebase store"
            );
            let sink: Arc<dyn AlertSink> =
                Arc::new(db.collection(config.alert_collection.clone()));
            let source: Arc<dyn MetricSource> = Arc::new(db);
            (source, sink)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, readings will stay empty");
            let source: Arc<dyn MetricSource> = Arc::new(MemorySource::new());
            let sink: Arc<dyn AlertSink> = Arc::new(MemorySink::new());
            (source, sink)
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
