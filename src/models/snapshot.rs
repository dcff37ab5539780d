// Telemetry snapshot pushed to /ws/telemetry after each jitter tick

use serde::{Deserialize, Serialize};

use super::{Agent, Container, Server, WorkspaceId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub timestamp: i64,
    pub servers: Vec<Server>,
    pub containers: Vec<Container>,
    pub agents: Vec<Agent>,
}

impl TelemetrySnapshot {
    /// Copy restricted to one workspace (per-client filter on the WebSocket).
    pub fn for_workspace(&self, workspace_id: &WorkspaceId) -> TelemetrySnapshot {
        TelemetrySnapshot {
            timestamp: self.timestamp,
            servers: self
                .servers
                .iter()
                .filter(|s| &s.workspace_id == workspace_id)
                .cloned()
                .collect(),
            containers: self
                .containers
                .iter()
                .filter(|c| &c.workspace_id == workspace_id)
                .cloned()
                .collect(),
            agents: self
                .agents
                .iter()
                .filter(|a| &a.workspace_id == workspace_id)
                .cloned()
                .collect(),
        }
    }
}
