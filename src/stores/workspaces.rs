// Workspace operations and the persisted active-workspace pointer

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{EntityStore, WriteSender};
use crate::models::{Workspace, WorkspaceId};
use crate::storage_repo::{KEY_ACTIVE_WORKSPACE, StorageRepo, StorageWrite};

impl EntityStore<Workspace> {
    pub async fn create(&self, name: &str) -> Workspace {
        let ws = Workspace {
            id: WorkspaceId::generate(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        info!(workspace_id = %ws.id, name = %ws.name, "workspace created");
        self.insert(ws).await
    }

    pub async fn exists(&self, id: &WorkspaceId) -> bool {
        self.get(id).await.is_some()
    }

    pub async fn first(&self) -> Option<Workspace> {
        self.items.read().await.first().cloned()
    }
}

/// Which workspace the dashboard shows. Stored under `activeWorkspaceId` as a raw string.
pub struct ActiveWorkspace {
    current: RwLock<Option<WorkspaceId>>,
    write_tx: WriteSender,
}

impl ActiveWorkspace {
    pub fn new(current: Option<WorkspaceId>, write_tx: WriteSender) -> Self {
        Self {
            current: RwLock::new(current),
            write_tx,
        }
    }

    pub async fn load(repo: &StorageRepo, write_tx: WriteSender) -> Self {
        let current = match repo.get(KEY_ACTIVE_WORKSPACE).await {
            Ok(v) => v.filter(|s| !s.is_empty()).map(WorkspaceId::from),
            Err(e) => {
                warn!(error = %e, operation = "load", "active workspace read failed");
                None
            }
        };
        Self::new(current, write_tx)
    }

    pub async fn get(&self) -> Option<WorkspaceId> {
        self.current.read().await.clone()
    }

    pub async fn set(&self, id: Option<WorkspaceId>) {
        let mut current = self.current.write().await;
        let write = match &id {
            Some(id) => StorageWrite::set(KEY_ACTIVE_WORKSPACE, id.as_str()),
            None => StorageWrite::remove(KEY_ACTIVE_WORKSPACE),
        };
        *current = id;
        if self.write_tx.send(write).is_err() {
            debug!(
                store = KEY_ACTIVE_WORKSPACE,
                "storage writer closed; change kept in memory only"
            );
        }
    }
}
