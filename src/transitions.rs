// Delayed, cancellable transitions keyed by entity id.
// Scheduling under a key that already has a pending task cancels that task: only the latest completes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Pending {
    generation: u64,
    token: CancellationToken,
}

#[derive(Clone, Default)]
pub struct Transitions {
    pending: Arc<Mutex<HashMap<String, Pending>>>,
    generation: Arc<AtomicU64>,
}

impl Transitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` under `key`. The task receives its own token and is aborted at its next
    /// await point once that token is cancelled.
    pub async fn spawn<F, Fut>(&self, key: impl Into<String>, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        let token = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut pending = self.pending.lock().await;
            let previous = pending.insert(
                key.clone(),
                Pending {
                    generation,
                    token: token.clone(),
                },
            );
            if let Some(previous) = previous {
                previous.token.cancel();
                debug!(key = %key, "superseded pending transition");
            }
        }

        let fut = task(token.clone());
        let pending = self.pending.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(key = %key, "transition cancelled");
                }
                () = fut => {}
            }
            let mut pending = pending.lock().await;
            if pending.get(&key).is_some_and(|p| p.generation == generation) {
                pending.remove(&key);
            }
        });
    }

    /// Runs `fut` after `delay` unless cancelled or superseded first.
    pub async fn schedule<Fut>(&self, key: impl Into<String>, delay: Duration, fut: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawn(key, move |_| async move {
            tokio::time::sleep(delay).await;
            fut.await;
        })
        .await;
    }

    /// Cancels the pending transition for `key`. Returns true if one was pending.
    pub async fn cancel(&self, key: &str) -> bool {
        match self.pending.lock().await.remove(key) {
            Some(p) => {
                p.token.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn cancel_all(&self) {
        let mut pending = self.pending.lock().await;
        for (_, p) in pending.drain() {
            p.token.cancel();
        }
    }

    pub async fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().await.contains_key(key)
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
