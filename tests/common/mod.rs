// Shared test helpers

#![allow(dead_code)]

use corsihub_sim::config::{DeletePolicy, SimulationConfig};
use corsihub_sim::dashboard::Dashboard;
use corsihub_sim::models::*;
use corsihub_sim::storage_repo::StorageWrite;
use corsihub_sim::stores::{
    ActiveWorkspace, AgentStore, ContainerStore, DomainStore, ServerStore, TokenStore,
    WorkspaceStore,
};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const RESTART_DELAY_MS: u64 = 2000;
pub const SSL_DELAY_MS: u64 = 5000;
pub const SEED_STEP_MS: u64 = 500;

pub fn test_simulation() -> SimulationConfig {
    SimulationConfig {
        restart_delay_ms: RESTART_DELAY_MS,
        ssl_activation_delay_ms: SSL_DELAY_MS,
        seed_step_delay_ms: SEED_STEP_MS,
        ..SimulationConfig::default()
    }
}

/// In-memory dashboard; the receiver collects mirror writes instead of a storage writer.
pub fn test_dashboard(policy: DeletePolicy) -> (Arc<Dashboard>, mpsc::UnboundedReceiver<StorageWrite>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let dashboard = Dashboard::new(
        WorkspaceStore::new(vec![], tx.clone()),
        ActiveWorkspace::new(None, tx.clone()),
        ServerStore::new(vec![], tx.clone()),
        ContainerStore::new(vec![], tx.clone()),
        DomainStore::new(vec![], tx.clone()),
        AgentStore::new(vec![], tx.clone()),
        TokenStore::new(vec![], tx),
        test_simulation(),
        policy,
    );
    (Arc::new(dashboard), rx)
}

/// Workspace "Acme" with one offline server "web-1" in us-east-1.
pub async fn acme_with_server(dashboard: &Arc<Dashboard>) -> (Workspace, Server) {
    let ws = dashboard.create_workspace("Acme", false).await.unwrap();
    let server = dashboard
        .create_server(NewServer {
            name: "web-1".into(),
            region: "us-east-1".into(),
            workspace_id: ws.id.clone(),
        })
        .await
        .unwrap();
    (ws, server)
}

pub fn new_container(name: &str, port: &str, server: &Server) -> NewContainer {
    NewContainer {
        name: name.into(),
        image: "nginx:alpine".into(),
        port: port.into(),
        server_id: server.id.clone(),
        workspace_id: server.workspace_id.clone(),
    }
}

pub fn new_domain(domain: &str, container_name: &str, workspace_id: &WorkspaceId) -> NewDomain {
    NewDomain {
        domain: domain.into(),
        container_name: container_name.into(),
        dns_type: DnsType::A,
        dns_value: "203.0.113.10".into(),
        workspace_id: workspace_id.clone(),
    }
}

pub fn new_agent(name: &str, server: &Server) -> NewAgent {
    NewAgent {
        name: name.into(),
        server_id: server.id.clone(),
        workspace_id: server.workspace_id.clone(),
    }
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<StorageWrite>) -> Vec<StorageWrite> {
    let mut out = Vec::new();
    while let Ok(w) = rx.try_recv() {
        out.push(w);
    }
    out
}

pub fn in_usage_range(v: f64) -> bool {
    (0.0..=100.0).contains(&v)
}
