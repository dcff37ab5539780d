// Simulated Docker containers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContainerId, Patch, ServerId, WorkspaceId};

/// Container state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Running,
    Stopped,
    Restarting,
}

/// `server_name` is copied from the server at creation and not kept in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub port: String,
    pub status: ContainerStatus,
    pub server_id: ServerId,
    pub server_name: String,
    pub workspace_id: WorkspaceId,
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub created_at: DateTime<Utc>,
}

impl Container {
    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContainer {
    pub name: String,
    pub image: String,
    pub port: String,
    pub server_id: ServerId,
    pub workspace_id: WorkspaceId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub port: Option<String>,
}

impl Patch<Container> for ContainerPatch {
    fn apply(self, container: &mut Container) {
        if let Some(name) = self.name {
            container.name = name.trim().to_string();
        }
        if let Some(image) = self.image {
            container.image = image.trim().to_string();
        }
        if let Some(port) = self.port {
            container.port = port.trim().to_string();
        }
    }
}
