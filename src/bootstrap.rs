// Starter infrastructure for a new workspace: servers, then containers, then domains, then agents.
// Ids flow from each step's return values; the step delay is cosmetic pacing only.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::models::{DnsType, NewAgent, NewContainer, NewDomain, NewServer, Server, WorkspaceId};

struct SeedContainer {
    name: &'static str,
    image: &'static str,
    port: &'static str,
    on_db: bool,
}

const SEED_CONTAINERS: &[SeedContainer] = &[
    SeedContainer {
        name: "nginx",
        image: "nginx:alpine",
        port: "80:80",
        on_db: false,
    },
    SeedContainer {
        name: "api",
        image: "node:20-alpine",
        port: "3000:3000",
        on_db: false,
    },
    SeedContainer {
        name: "postgres",
        image: "postgres:16",
        port: "5432:5432",
        on_db: true,
    },
];

/// Runs the seeding sequence. Stops early when `cancel` fires or a step fails
/// (e.g. the workspace was deleted in between).
pub async fn seed_workspace(
    dashboard: Arc<Dashboard>,
    workspace_id: WorkspaceId,
    step: Duration,
    cancel: CancellationToken,
) {
    match run(&dashboard, &workspace_id, step, &cancel).await {
        Ok(true) => info!(workspace_id = %workspace_id, "workspace seeded"),
        Ok(false) => info!(workspace_id = %workspace_id, "workspace seeding cancelled"),
        Err(e) => warn!(error = %e, workspace_id = %workspace_id, "workspace seeding aborted"),
    }
}

/// Ok(false) when cancelled between steps.
async fn run(
    dashboard: &Dashboard,
    workspace_id: &WorkspaceId,
    step: Duration,
    cancel: &CancellationToken,
) -> Result<bool> {
    if !pause(step, cancel).await {
        return Ok(false);
    }
    let web = seed_server(dashboard, workspace_id, "web-server-01", "us-east-1").await?;
    let db = seed_server(dashboard, workspace_id, "db-server-01", "eu-west-1").await?;

    if !pause(step, cancel).await {
        return Ok(false);
    }
    for c in SEED_CONTAINERS {
        let server = if c.on_db { &db } else { &web };
        dashboard
            .create_container(NewContainer {
                name: c.name.into(),
                image: c.image.into(),
                port: c.port.into(),
                server_id: server.id.clone(),
                workspace_id: workspace_id.clone(),
            })
            .await?;
    }

    if !pause(step, cancel).await {
        return Ok(false);
    }
    let slug = workspace_slug(dashboard, workspace_id).await;
    let apex = format!("{}.corsihub.app", slug);
    if !dashboard.domains.exists_named(&apex).await {
        dashboard
            .create_domain(NewDomain {
                domain: apex.clone(),
                container_name: "nginx".into(),
                dns_type: DnsType::A,
                dns_value: web.ip.clone(),
                workspace_id: workspace_id.clone(),
            })
            .await?;
        dashboard
            .create_domain(NewDomain {
                domain: format!("api.{}", apex),
                container_name: "api".into(),
                dns_type: DnsType::Cname,
                dns_value: apex.clone(),
                workspace_id: workspace_id.clone(),
            })
            .await?;
    }

    if !pause(step, cancel).await {
        return Ok(false);
    }
    for (name, server) in [("agent-web-01", &web), ("agent-db-01", &db)] {
        dashboard
            .create_agent(NewAgent {
                name: name.into(),
                server_id: server.id.clone(),
                workspace_id: workspace_id.clone(),
            })
            .await?;
    }
    Ok(true)
}

async fn seed_server(
    dashboard: &Dashboard,
    workspace_id: &WorkspaceId,
    name: &str,
    region: &str,
) -> Result<Server> {
    let server = dashboard
        .create_server(NewServer {
            name: name.into(),
            region: region.into(),
            workspace_id: workspace_id.clone(),
        })
        .await?;
    Ok(dashboard.servers.start(&server.id).await.unwrap_or(server))
}

/// False if cancelled while waiting.
async fn pause(step: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(step) => true,
    }
}

/// Lowercase alphanumerics of the workspace name joined by `-`; falls back to the id.
async fn workspace_slug(dashboard: &Dashboard, workspace_id: &WorkspaceId) -> String {
    let name = dashboard
        .workspaces
        .get(workspace_id)
        .await
        .map(|w| w.name)
        .unwrap_or_default();
    let slug = slugify(&name);
    if slug.is_empty() {
        workspace_id.to_string()
    } else {
        slug
    }
}

pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
