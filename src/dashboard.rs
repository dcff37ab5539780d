// Composition root: owns every store, validates cross-store references, applies the delete policy.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::bootstrap;
use crate::config::{DeletePolicy, SimulationConfig};
use crate::error::{Error, Result};
use crate::models::{
    Agent, AgentId, ApiToken, Container, ContainerId, ContainerPatch, Domain, DomainId,
    DomainPatch, NewAgent, NewContainer, NewDomain, NewServer, Server, ServerId, SslStatus,
    TelemetrySnapshot, TokenId, Workspace, WorkspaceId,
};
use crate::storage_repo::StorageRepo;
use crate::stores::{
    ActiveWorkspace, AgentStore, ContainerStore, DomainStore, ServerStore, TokenStore,
    WorkspaceStore, WriteSender,
};
use crate::transitions::Transitions;
use crate::validate;

pub struct Dashboard {
    pub workspaces: Arc<WorkspaceStore>,
    pub active_workspace: ActiveWorkspace,
    pub servers: Arc<ServerStore>,
    pub containers: Arc<ContainerStore>,
    pub domains: Arc<DomainStore>,
    pub agents: Arc<AgentStore>,
    pub tokens: Arc<TokenStore>,
    seeding: Transitions,
    /// Held across reference checks and the writes that depend on them, and across cascades.
    write_lock: Mutex<()>,
    simulation: SimulationConfig,
    on_delete: DeletePolicy,
}

/// Entity counts for stats logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub workspaces: usize,
    pub servers: usize,
    pub containers: usize,
    pub domains: usize,
    pub agents: usize,
    pub tokens: usize,
    pub pending_transitions: usize,
}

impl Dashboard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workspaces: WorkspaceStore,
        active_workspace: ActiveWorkspace,
        servers: ServerStore,
        containers: ContainerStore,
        domains: DomainStore,
        agents: AgentStore,
        tokens: TokenStore,
        simulation: SimulationConfig,
        on_delete: DeletePolicy,
    ) -> Self {
        Self {
            workspaces: Arc::new(workspaces),
            active_workspace,
            servers: Arc::new(servers),
            containers: Arc::new(containers),
            domains: Arc::new(domains),
            agents: Arc::new(agents),
            tokens: Arc::new(tokens),
            seeding: Transitions::new(),
            write_lock: Mutex::new(()),
            simulation,
            on_delete,
        }
    }

    /// Loads every store, expires overdue certificates and re-schedules pending SSL issuance.
    pub async fn load(
        repo: &StorageRepo,
        write_tx: WriteSender,
        simulation: SimulationConfig,
        on_delete: DeletePolicy,
    ) -> Arc<Self> {
        let dashboard = Arc::new(Self::new(
            WorkspaceStore::load(repo, write_tx.clone()).await,
            ActiveWorkspace::load(repo, write_tx.clone()).await,
            ServerStore::load(repo, write_tx.clone()).await,
            ContainerStore::load(repo, write_tx.clone()).await,
            DomainStore::load(repo, write_tx.clone()).await,
            AgentStore::load(repo, write_tx.clone()).await,
            TokenStore::load(repo, write_tx).await,
            simulation,
            on_delete,
        ));

        dashboard.domains.sweep_expired(Utc::now()).await;
        let pending = dashboard
            .domains
            .find_all(|d| d.ssl_status == SslStatus::Pending)
            .await;
        for d in &pending {
            dashboard
                .domains
                .activate_after(
                    &d.id,
                    dashboard.simulation.ssl_activation_delay(),
                    dashboard.simulation.ssl_validity(),
                )
                .await;
        }
        dashboard.repair_active_workspace().await;

        let counts = dashboard.counts().await;
        info!(
            workspaces = counts.workspaces,
            servers = counts.servers,
            containers = counts.containers,
            domains = counts.domains,
            agents = counts.agents,
            tokens = counts.tokens,
            "dashboard state loaded"
        );
        dashboard
    }

    pub fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.on_delete
    }

    // --- workspaces ---

    /// Creates a workspace, makes it active, and optionally seeds it with demo infrastructure.
    pub async fn create_workspace(self: &Arc<Self>, name: &str, seed: bool) -> Result<Workspace> {
        validate::name("workspace name", name, 1)?;
        let ws = {
            let _guard = self.write_lock.lock().await;
            let ws = self.workspaces.create(name).await;
            self.active_workspace.set(Some(ws.id.clone())).await;
            ws
        };
        if seed {
            let dashboard = Arc::clone(self);
            let workspace_id = ws.id.clone();
            let step = self.simulation.seed_step_delay();
            self.seeding
                .spawn(ws.id.as_str(), move |token| async move {
                    bootstrap::seed_workspace(dashboard, workspace_id, step, token).await;
                })
                .await;
        }
        Ok(ws)
    }

    pub async fn set_active_workspace(&self, id: &WorkspaceId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.require_workspace(id).await?;
        self.active_workspace.set(Some(id.clone())).await;
        Ok(())
    }

    pub async fn active_workspace(&self) -> Option<Workspace> {
        let id = self.active_workspace.get().await?;
        self.workspaces.get(&id).await
    }

    /// Deletes the workspace under the delete policy. Cascade removes all of its entities.
    pub async fn delete_workspace(&self, id: &WorkspaceId) -> Result<Workspace> {
        let _guard = self.write_lock.lock().await;
        self.require_workspace(id).await?;
        let dependents = self.servers.count_by_workspace(id).await
            + self.containers.count_by_workspace(id).await
            + self.domains.count_by_workspace(id).await
            + self.agents.count_by_workspace(id).await;
        if self.on_delete == DeletePolicy::Restrict && dependents > 0 {
            return Err(Error::HasDependents {
                entity: "workspace",
                id: id.to_string(),
                dependents,
            });
        }

        self.seeding.cancel(id.as_str()).await;
        self.agents.delete_where(|a| &a.workspace_id == id).await;
        self.domains.delete_where(|d| &d.workspace_id == id).await;
        self.containers.delete_where(|c| &c.workspace_id == id).await;
        self.servers.delete_where(|s| &s.workspace_id == id).await;
        let ws = self
            .workspaces
            .delete(id)
            .await
            .ok_or_else(|| Error::WorkspaceNotFound(id.to_string()))?;
        info!(workspace_id = %id, cascaded = dependents, "workspace deleted");
        self.repair_active_workspace().await;
        Ok(ws)
    }

    // --- servers ---

    pub async fn create_server(&self, new: NewServer) -> Result<Server> {
        validate::name("server name", &new.name, 2)?;
        validate::name("region", &new.region, 1)?;
        let _guard = self.write_lock.lock().await;
        self.require_workspace(&new.workspace_id).await?;
        Ok(self.servers.create(new).await)
    }

    /// Cascade removes containers (and their domains) and agents on the server.
    pub async fn delete_server(&self, id: &ServerId) -> Result<Server> {
        let _guard = self.write_lock.lock().await;
        let server = self
            .servers
            .get(id)
            .await
            .ok_or_else(|| Error::ServerNotFound(id.to_string()))?;
        let containers = self.containers.on_server(id).await;
        let agents = self.agents.on_server(id).await;
        let mut domains = Vec::new();
        for c in &containers {
            domains.extend(self.domains.bound_to(&c.workspace_id, &c.name).await);
        }
        let dependents = containers.len() + agents.len() + domains.len();
        if self.on_delete == DeletePolicy::Restrict && dependents > 0 {
            return Err(Error::HasDependents {
                entity: "server",
                id: id.to_string(),
                dependents,
            });
        }

        for d in &domains {
            self.domains.delete(&d.id).await;
        }
        self.containers.delete_where(|c| &c.server_id == id).await;
        self.agents.delete_where(|a| &a.server_id == id).await;
        self.servers.delete(id).await;
        info!(server_id = %id, cascaded = dependents, "server deleted");
        Ok(server)
    }

    pub async fn restart_server(&self, id: &ServerId) -> Option<Server> {
        self.servers
            .restart(id, self.simulation.restart_delay())
            .await
    }

    // --- containers ---

    /// The server must exist in the same workspace; its current name is copied onto the container.
    /// Container names are unique per workspace since domains bind to them by name.
    pub async fn create_container(&self, new: NewContainer) -> Result<Container> {
        validate::name("container name", &new.name, 2)?;
        validate::name("image", &new.image, 1)?;
        validate::port_mapping(&new.port)?;
        let _guard = self.write_lock.lock().await;
        self.require_workspace(&new.workspace_id).await?;
        let server = self
            .servers
            .get(&new.server_id)
            .await
            .ok_or_else(|| Error::ServerNotFound(new.server_id.to_string()))?;
        if server.workspace_id != new.workspace_id {
            return Err(Error::InvalidParameter(format!(
                "server {} belongs to another workspace",
                server.id
            )));
        }
        self.require_unique_container_name(&new.workspace_id, &new.name, None)
            .await?;
        Ok(self.containers.create(new, &server.name).await)
    }

    /// A rename carries the domains bound to the old name over to the new one
    /// (`restrict` refuses the rename while any are bound).
    pub async fn update_container(&self, id: &ContainerId, patch: ContainerPatch) -> Result<Container> {
        if let Some(name) = &patch.name {
            validate::name("container name", name, 2)?;
        }
        if let Some(image) = &patch.image {
            validate::name("image", image, 1)?;
        }
        if let Some(port) = &patch.port {
            validate::port_mapping(port)?;
        }
        let _guard = self.write_lock.lock().await;
        let current = self
            .containers
            .get(id)
            .await
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;
        let renamed_to = patch
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| *name != current.name)
            .map(str::to_string);
        if let Some(new_name) = &renamed_to {
            self.require_unique_container_name(&current.workspace_id, new_name, Some(id))
                .await?;
            let bound = self
                .domains
                .bound_to(&current.workspace_id, &current.name)
                .await;
            if !bound.is_empty() {
                if self.on_delete == DeletePolicy::Restrict {
                    return Err(Error::HasDependents {
                        entity: "container",
                        id: id.to_string(),
                        dependents: bound.len(),
                    });
                }
                let rebound = self
                    .domains
                    .modify_all(|d| {
                        if d.workspace_id == current.workspace_id && d.container_name == current.name {
                            d.container_name = new_name.clone();
                            true
                        } else {
                            false
                        }
                    })
                    .await;
                info!(container_id = %id, from = %current.name, to = %new_name, rebound, "domains rebound to renamed container");
            }
        }
        self.containers.update(id, patch).await;
        self.containers
            .get(id)
            .await
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))
    }

    /// Cascade removes the domains bound to this container's name.
    pub async fn delete_container(&self, id: &ContainerId) -> Result<Container> {
        let _guard = self.write_lock.lock().await;
        let container = self
            .containers
            .get(id)
            .await
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;
        let domains = self
            .domains
            .bound_to(&container.workspace_id, &container.name)
            .await;
        if self.on_delete == DeletePolicy::Restrict && !domains.is_empty() {
            return Err(Error::HasDependents {
                entity: "container",
                id: id.to_string(),
                dependents: domains.len(),
            });
        }
        for d in &domains {
            self.domains.delete(&d.id).await;
        }
        self.containers.delete(id).await;
        info!(container_id = %id, cascaded = domains.len(), "container deleted");
        Ok(container)
    }

    pub async fn restart_container(&self, id: &ContainerId) -> Option<Container> {
        self.containers
            .restart(id, self.simulation.restart_delay())
            .await
    }

    // --- domains ---

    /// `container_name` must name a container in the same workspace. SSL issuance is scheduled.
    pub async fn create_domain(&self, new: NewDomain) -> Result<Domain> {
        validate::domain_name(&new.domain)?;
        validate::name("dns value", &new.dns_value, 1)?;
        let _guard = self.write_lock.lock().await;
        self.require_workspace(&new.workspace_id).await?;
        let bound = self
            .containers
            .find_all(|c| c.workspace_id == new.workspace_id && c.name == new.container_name.trim())
            .await;
        if bound.is_empty() {
            return Err(Error::ContainerNotFound(new.container_name.clone()));
        }
        if self.domains.exists_named(&new.domain).await {
            return Err(Error::InvalidParameter(format!(
                "domain {} already exists",
                new.domain.trim()
            )));
        }
        let domain = self
            .domains
            .create(new, self.simulation.ssl_validity())
            .await;
        self.domains
            .activate_after(
                &domain.id,
                self.simulation.ssl_activation_delay(),
                self.simulation.ssl_validity(),
            )
            .await;
        Ok(domain)
    }

    /// Rebinding to another container requires that container to exist in the domain's workspace.
    pub async fn update_domain(&self, id: &DomainId, patch: DomainPatch) -> Result<Domain> {
        if let Some(value) = &patch.dns_value {
            validate::name("dns value", value, 1)?;
        }
        let _guard = self.write_lock.lock().await;
        let current = self
            .domains
            .get(id)
            .await
            .ok_or_else(|| Error::DomainNotFound(id.to_string()))?;
        if let Some(name) = &patch.container_name {
            let name = name.trim();
            let bound = self
                .containers
                .find_all(|c| c.workspace_id == current.workspace_id && c.name == name)
                .await;
            if bound.is_empty() {
                return Err(Error::ContainerNotFound(name.to_string()));
            }
        }
        self.domains.update(id, patch).await;
        self.domains
            .get(id)
            .await
            .ok_or_else(|| Error::DomainNotFound(id.to_string()))
    }

    pub async fn renew_ssl(&self, id: &DomainId) -> Option<Domain> {
        self.domains
            .renew_ssl(
                id,
                self.simulation.ssl_activation_delay(),
                self.simulation.ssl_validity(),
            )
            .await
    }

    // --- agents ---

    pub async fn create_agent(&self, new: NewAgent) -> Result<Agent> {
        validate::name("agent name", &new.name, 2)?;
        let _guard = self.write_lock.lock().await;
        self.require_workspace(&new.workspace_id).await?;
        let server = self
            .servers
            .get(&new.server_id)
            .await
            .ok_or_else(|| Error::ServerNotFound(new.server_id.to_string()))?;
        if server.workspace_id != new.workspace_id {
            return Err(Error::InvalidParameter(format!(
                "server {} belongs to another workspace",
                server.id
            )));
        }
        Ok(self.agents.create(new, &server.name).await)
    }

    pub async fn restart_agent(&self, id: &AgentId) -> Option<Agent> {
        self.agents
            .restart(id, self.simulation.restart_delay())
            .await
    }

    // --- tokens ---

    pub async fn generate_token(&self, name: &str) -> Result<ApiToken> {
        validate::name("token name", name, 1)?;
        Ok(self.tokens.generate(name).await)
    }

    pub async fn revoke_token(&self, id: &TokenId) -> Result<ApiToken> {
        self.tokens
            .revoke(id)
            .await
            .ok_or_else(|| Error::TokenNotFound(id.to_string()))
    }

    // --- simulation ---

    /// One jitter tick over every store; returns the snapshot to publish.
    pub async fn tick_telemetry(&self) -> TelemetrySnapshot {
        self.servers.jitter_telemetry().await;
        self.containers.jitter_telemetry().await;
        self.agents.jitter_telemetry().await;
        TelemetrySnapshot {
            timestamp: Utc::now().timestamp_millis(),
            servers: self.servers.all().await,
            containers: self.containers.all().await,
            agents: self.agents.all().await,
        }
    }

    pub async fn counts(&self) -> DashboardCounts {
        DashboardCounts {
            workspaces: self.workspaces.len().await,
            servers: self.servers.len().await,
            containers: self.containers.len().await,
            domains: self.domains.len().await,
            agents: self.agents.len().await,
            tokens: self.tokens.len().await,
            pending_transitions: self.servers.transitions().pending_count().await
                + self.containers.transitions().pending_count().await
                + self.domains.transitions().pending_count().await
                + self.agents.transitions().pending_count().await
                + self.seeding.pending_count().await,
        }
    }

    /// Cancels every delayed transition and seeding task.
    pub async fn shutdown(&self) {
        self.seeding.cancel_all().await;
        self.servers.transitions().cancel_all().await;
        self.containers.transitions().cancel_all().await;
        self.domains.transitions().cancel_all().await;
        self.agents.transitions().cancel_all().await;
    }

    async fn require_workspace(&self, id: &WorkspaceId) -> Result<()> {
        if self.workspaces.exists(id).await {
            Ok(())
        } else {
            Err(Error::WorkspaceNotFound(id.to_string()))
        }
    }

    async fn require_unique_container_name(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
        except: Option<&ContainerId>,
    ) -> Result<()> {
        let name = name.trim();
        let taken = self
            .containers
            .find_all(|c| &c.workspace_id == workspace_id && c.name == name && Some(&c.id) != except)
            .await;
        if taken.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidParameter(format!(
                "container {} already exists in this workspace",
                name
            )))
        }
    }

    /// Points the active workspace at an existing one (first by insertion order) or clears it.
    async fn repair_active_workspace(&self) {
        if let Some(id) = self.active_workspace.get().await
            && self.workspaces.exists(&id).await
        {
            return;
        }
        let previous = self.active_workspace.get().await;
        let fallback = self.workspaces.first().await.map(|w| w.id);
        if previous.is_some() && fallback.is_none() {
            warn!("active workspace no longer exists and none remain; cleared");
        }
        if previous != fallback {
            self.active_workspace.set(fallback).await;
        }
    }
}
