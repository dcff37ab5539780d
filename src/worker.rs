// Background simulation worker (telemetry jitter, domain expiry sweep, stats logging).
// Persistence runs in a dedicated storage writer task fed by the stores through a channel.

use crate::dashboard::Dashboard;
use crate::models::TelemetrySnapshot;
use crate::storage_repo::{StorageRepo, StorageWrite};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, Instant, interval};
use tokio_util::sync::CancellationToken;

/// Rate limit for "no receivers" message (avoid logging every tick when no one is on /ws/telemetry)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Dashboard, channels, and shutdown for the worker.
pub struct WorkerDeps {
    pub dashboard: Arc<Dashboard>,
    pub tx: broadcast::Sender<TelemetrySnapshot>,
    pub ws_connections: Arc<AtomicUsize>,
    pub writes_flushed_total: Arc<AtomicU64>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct WorkerConfig {
    pub telemetry_interval_ms: u64,
    pub domain_sweep_interval_secs: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Writer config: coalescing and flushing for the storage writer task.
pub struct StorageWriterConfig {
    /// Flush once this many distinct keys are buffered.
    pub max_pending_writes: usize,
    pub flush_interval_ms: u64,
}

/// Spawns the task that receives mirror writes from the stores and flushes them to the repo.
/// Writes to the same key are coalesced (last one wins). Flushes when the buffer holds
/// `max_pending_writes` keys, every `flush_interval_ms`, and when `shutdown` fires or all
/// senders are dropped (after draining what is already queued).
pub fn spawn_storage_writer(
    mut write_rx: mpsc::UnboundedReceiver<StorageWrite>,
    repo: Arc<StorageRepo>,
    config: StorageWriterConfig,
    writes_flushed_total: Arc<AtomicU64>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let flush_interval = Duration::from_millis(config.flush_interval_ms);
    tokio::spawn(async move {
        let mut buffer: BTreeMap<String, Option<String>> = BTreeMap::new();
        let mut flush_tick = interval(flush_interval);
        flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = write_rx.recv() => {
                    match result {
                        Some(write) => {
                            buffer.insert(write.key, write.value);
                            if buffer.len() >= config.max_pending_writes
                                && let Err(e) = flush_buffer(&repo, &mut buffer, &writes_flushed_total).await
                            {
                                tracing::warn!(error = %e, "storage writer: apply failed");
                            }
                        }
                        None => break,
                    }
                }
                _ = flush_tick.tick() => {
                    if let Err(e) = flush_buffer(&repo, &mut buffer, &writes_flushed_total).await {
                        tracing::warn!(error = %e, "storage writer: apply failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    while let Ok(write) = write_rx.try_recv() {
                        buffer.insert(write.key, write.value);
                    }
                    break;
                }
            }
        }
        if let Err(e) = flush_buffer(&repo, &mut buffer, &writes_flushed_total).await {
            tracing::warn!(error = %e, "storage writer: final flush failed");
        }
        tracing::debug!("Storage writer shutting down");
    })
}

async fn flush_buffer(
    repo: &StorageRepo,
    buffer: &mut BTreeMap<String, Option<String>>,
    writes_flushed_total: &AtomicU64,
) -> anyhow::Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let writes: Vec<StorageWrite> = buffer
        .iter()
        .map(|(key, value)| StorageWrite {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    repo.apply(&writes).await?;
    writes_flushed_total.fetch_add(writes.len() as u64, Ordering::Relaxed);
    buffer.clear();
    tracing::debug!(
        operation = "apply",
        writes_count = writes.len(),
        "Storage writes flushed"
    );
    Ok(())
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        dashboard,
        tx,
        ws_connections,
        writes_flushed_total,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        telemetry_interval_ms,
        domain_sweep_interval_secs,
        stats_log_interval_secs,
    } = config;

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(telemetry_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut sweep_tick = interval(Duration::from_secs(domain_sweep_interval_secs));
        sweep_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut ticks_total: u64 = 0;
        let mut expired_total: usize = 0;
        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let snapshot = dashboard.tick_telemetry().await;
                    ticks_total += 1;
                    if tx.send(snapshot).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_snapshot",
                                "No active WebSocket clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                }
                _ = sweep_tick.tick() => {
                    expired_total += dashboard.domains.sweep_expired(chrono::Utc::now()).await;
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    let counts = dashboard.counts().await;
                    tracing::info!(
                        workspaces = counts.workspaces,
                        servers = counts.servers,
                        containers = counts.containers,
                        domains = counts.domains,
                        agents = counts.agents,
                        pending_transitions = counts.pending_transitions,
                        ws_clients = ws_connections.load(Ordering::Relaxed),
                        telemetry_ticks_total = ticks_total,
                        ssl_expired_total = expired_total,
                        storage_writes_flushed_total = writes_flushed_total.load(Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
    })
}
