// In-memory entity stores mirrored to the key/value repo.
// One generic store; entity-specific operations live in the submodules as inherent impls.

mod agents;
mod containers;
mod domains;
mod servers;
mod tokens;
mod workspaces;

pub use workspaces::ActiveWorkspace;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use crate::models::{
    Agent, AgentId, ApiToken, Container, ContainerId, Domain, DomainId, Patch, Server, ServerId,
    TokenId, Workspace, WorkspaceId,
};
use crate::storage_repo::{self, StorageRepo, StorageWrite};
use crate::transitions::Transitions;

pub type WorkspaceStore = EntityStore<Workspace>;
pub type ServerStore = EntityStore<Server>;
pub type ContainerStore = EntityStore<Container>;
pub type DomainStore = EntityStore<Domain>;
pub type AgentStore = EntityStore<Agent>;
pub type TokenStore = EntityStore<ApiToken>;

/// Sender half of the storage writer channel.
pub type WriteSender = mpsc::UnboundedSender<StorageWrite>;

pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: PartialEq + Clone + Display + AsRef<str> + Send + Sync;

    /// Storage key holding the JSON array of all entities of this type.
    const STORAGE_KEY: &'static str;

    fn id(&self) -> &Self::Id;
}

pub trait WorkspaceScoped: Entity {
    fn workspace_id(&self) -> &WorkspaceId;
}

macro_rules! impl_entity {
    ($ty:ty, $id:ty, $key:expr) => {
        impl Entity for $ty {
            type Id = $id;
            const STORAGE_KEY: &'static str = $key;

            fn id(&self) -> &$id {
                &self.id
            }
        }
    };
    ($ty:ty, $id:ty, $key:expr, scoped) => {
        impl_entity!($ty, $id, $key);

        impl WorkspaceScoped for $ty {
            fn workspace_id(&self) -> &WorkspaceId {
                &self.workspace_id
            }
        }
    };
}

impl_entity!(Workspace, WorkspaceId, storage_repo::KEY_WORKSPACES);
impl_entity!(Server, ServerId, storage_repo::KEY_SERVERS, scoped);
impl_entity!(Container, ContainerId, storage_repo::KEY_CONTAINERS, scoped);
impl_entity!(Domain, DomainId, storage_repo::KEY_DOMAINS, scoped);
impl_entity!(Agent, AgentId, storage_repo::KEY_AGENTS, scoped);
impl_entity!(ApiToken, TokenId, storage_repo::KEY_API_TOKENS);

pub struct EntityStore<T: Entity> {
    items: RwLock<Vec<T>>,
    write_tx: WriteSender,
    transitions: Transitions,
}

impl<T: Entity> EntityStore<T> {
    pub fn new(items: Vec<T>, write_tx: WriteSender) -> Self {
        Self {
            items: RwLock::new(items),
            write_tx,
            transitions: Transitions::new(),
        }
    }

    /// Reads `T::STORAGE_KEY`. Missing, unreadable or malformed data yields an empty store.
    pub async fn load(repo: &StorageRepo, write_tx: WriteSender) -> Self {
        let items = match repo.get(T::STORAGE_KEY).await {
            Ok(Some(raw)) => parse_items::<T>(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(
                    error = %e,
                    store = T::STORAGE_KEY,
                    operation = "load",
                    "storage read failed; starting empty"
                );
                Vec::new()
            }
        };
        debug!(store = T::STORAGE_KEY, count = items.len(), "store loaded");
        Self::new(items, write_tx)
    }

    pub async fn all(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    pub async fn get(&self, id: &T::Id) -> Option<T> {
        self.items.read().await.iter().find(|e| e.id() == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Entities matching `pred`, in insertion order.
    pub async fn find_all(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.items
            .read()
            .await
            .iter()
            .filter(|e| pred(e))
            .cloned()
            .collect()
    }

    /// Merges `patch` into the entity. No-op (false) when the id is unknown.
    pub async fn update(&self, id: &T::Id, patch: impl Patch<T>) -> bool {
        self.modify(id, |e| patch.apply(e)).await.is_some()
    }

    /// Removes the entity and cancels any pending transition for it. No cascade.
    pub async fn delete(&self, id: &T::Id) -> Option<T> {
        let mut items = self.items.write().await;
        self.transitions.cancel(id.as_ref()).await;
        let pos = items.iter().position(|e| e.id() == id)?;
        let removed = items.remove(pos);
        self.mirror(&items);
        Some(removed)
    }

    /// Removes every entity matching `pred`; returns what was removed.
    pub async fn delete_where(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let mut items = self.items.write().await;
        let (removed, kept): (Vec<T>, Vec<T>) = items.drain(..).partition(|e| pred(e));
        *items = kept;
        for e in &removed {
            self.transitions.cancel(e.id().as_ref()).await;
        }
        if !removed.is_empty() {
            self.mirror(&items);
        }
        removed
    }

    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    pub(crate) async fn insert(&self, entity: T) -> T {
        let mut items = self.items.write().await;
        items.push(entity.clone());
        self.mirror(&items);
        entity
    }

    /// Applies `f` to the entity with `id` and returns the updated copy.
    pub(crate) async fn modify(&self, id: &T::Id, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut items = self.items.write().await;
        let entity = items.iter_mut().find(|e| e.id() == id)?;
        f(entity);
        let updated = entity.clone();
        self.mirror(&items);
        Some(updated)
    }

    /// Like [`Self::modify`], but first cancels any pending transition for `id`.
    /// Both happen under the write lock, so a transition scheduled concurrently
    /// is either cancelled here or scheduled after this change.
    pub(crate) async fn modify_cancelling(&self, id: &T::Id, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut items = self.items.write().await;
        self.transitions.cancel(id.as_ref()).await;
        let entity = items.iter_mut().find(|e| e.id() == id)?;
        f(entity);
        let updated = entity.clone();
        self.mirror(&items);
        Some(updated)
    }

    /// Applies `f` and registers `completion` to run after `delay`, under one write lock.
    /// Nothing is scheduled when `id` is unknown.
    pub(crate) async fn modify_scheduling<Fut>(
        &self,
        id: &T::Id,
        f: impl FnOnce(&mut T),
        delay: Duration,
        completion: Fut,
    ) -> Option<T>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut items = self.items.write().await;
        let entity = items.iter_mut().find(|e| e.id() == id)?;
        f(entity);
        let updated = entity.clone();
        self.mirror(&items);
        self.transitions
            .schedule(id.as_ref().to_string(), delay, completion)
            .await;
        Some(updated)
    }

    /// Applies `f` to every entity; `f` reports whether it changed anything. Returns the change count.
    pub(crate) async fn modify_all(&self, mut f: impl FnMut(&mut T) -> bool) -> usize {
        let mut items = self.items.write().await;
        let mut changed = 0;
        for e in items.iter_mut() {
            if f(e) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.mirror(&items);
        }
        changed
    }

    /// Queues the full list for persistence. Called with the write lock held so queue order matches state order.
    fn mirror(&self, items: &[T]) {
        match serde_json::to_string(items) {
            Ok(json) => {
                if self
                    .write_tx
                    .send(StorageWrite::set(T::STORAGE_KEY, json))
                    .is_err()
                {
                    debug!(store = T::STORAGE_KEY, "storage writer closed; change kept in memory only");
                }
            }
            Err(e) => {
                warn!(error = %e, store = T::STORAGE_KEY, operation = "mirror", "serialize failed");
            }
        }
    }
}

impl<T: WorkspaceScoped> EntityStore<T> {
    pub async fn get_all_by_workspace(&self, workspace_id: &WorkspaceId) -> Vec<T> {
        self.find_all(|e| e.workspace_id() == workspace_id).await
    }

    pub async fn count_by_workspace(&self, workspace_id: &WorkspaceId) -> usize {
        self.items
            .read()
            .await
            .iter()
            .filter(|e| e.workspace_id() == workspace_id)
            .count()
    }
}

fn parse_items<T: Entity>(raw: &str) -> Vec<T> {
    match serde_json::from_str::<Vec<T>>(raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(
                error = %e,
                store = T::STORAGE_KEY,
                operation = "load",
                "malformed persisted data; starting empty"
            );
            Vec::new()
        }
    }
}
