// Simulated virtual machines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Patch, ServerId, WorkspaceId};

/// Server power state; serializes to lowercase JSON (e.g. "online").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: ServerId,
    pub name: String,
    pub region: String,
    pub status: ServerStatus,
    pub agent_connected: bool,
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub ip: String,
    pub os: String,
    pub workspace_id: WorkspaceId,
    pub created_at: DateTime<Utc>,
}

impl Server {
    pub fn is_online(&self) -> bool {
        self.status == ServerStatus::Online
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServer {
    pub name: String,
    pub region: String,
    pub workspace_id: WorkspaceId,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPatch {
    pub name: Option<String>,
    pub region: Option<String>,
    pub ip: Option<String>,
    pub os: Option<String>,
}

impl Patch<Server> for ServerPatch {
    fn apply(self, server: &mut Server) {
        if let Some(name) = self.name {
            server.name = name.trim().to_string();
        }
        if let Some(region) = self.region {
            server.region = region.trim().to_string();
        }
        if let Some(ip) = self.ip {
            server.ip = ip.trim().to_string();
        }
        if let Some(os) = self.os {
            server.os = os.trim().to_string();
        }
    }
}
