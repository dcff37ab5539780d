use anyhow::Result;
use corsihub_sim::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(name = version::NAME, version = version::VERSION, "starting");

    let storage_repo = Arc::new(storage_repo::StorageRepo::connect(&app_config.storage.path).await?);
    storage_repo.init().await?;

    let writes_flushed_total = Arc::new(AtomicU64::new(0));
    let writer_shutdown = CancellationToken::new();
    let (write_tx, write_rx) = mpsc::unbounded_channel();
    let writer_handle = worker::spawn_storage_writer(
        write_rx,
        storage_repo.clone(),
        worker::StorageWriterConfig {
            max_pending_writes: app_config.storage.max_pending_writes,
            flush_interval_ms: app_config.storage.flush_interval_ms,
        },
        writes_flushed_total.clone(),
        writer_shutdown.clone(),
    );

    let dashboard = dashboard::Dashboard::load(
        &storage_repo,
        write_tx,
        app_config.simulation.clone(),
        app_config.integrity.on_delete,
    )
    .await;

    let (tx, _) =
        broadcast::channel::<models::TelemetrySnapshot>(app_config.publishing.broadcast_capacity);
    let ws_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            dashboard: dashboard.clone(),
            tx: tx.clone(),
            ws_connections: ws_connections.clone(),
            writes_flushed_total,
            shutdown_rx,
        },
        worker::WorkerConfig {
            telemetry_interval_ms: app_config.simulation.telemetry_interval_ms,
            domain_sweep_interval_secs: app_config.simulation.domain_sweep_interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let app = routes::app(dashboard.clone(), tx, ws_connections);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
        }
    }

    let _ = shutdown_tx.send(());
    let _ = worker_handle.await;
    dashboard.shutdown().await;
    writer_shutdown.cancel();
    let _ = writer_handle.await;

    Ok(())
}
