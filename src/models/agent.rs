// Simulated monitoring agents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AgentId, Patch, ServerId, WorkspaceId};

pub const INITIAL_AGENT_VERSION: &str = "v1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
    Offline,
}

/// `last_heartbeat` is a display string ("12s ago"), regenerated on every telemetry tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub status: AgentStatus,
    pub last_heartbeat: String,
    pub version: String,
    pub server_id: ServerId,
    pub server_name: String,
    pub workspace_id: WorkspaceId,
    pub cpu_usage: f64,
    pub ram_usage: f64,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn is_online(&self) -> bool {
        self.status == AgentStatus::Online
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    pub name: String,
    pub server_id: ServerId,
    pub workspace_id: WorkspaceId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    pub name: Option<String>,
}

impl Patch<Agent> for AgentPatch {
    fn apply(self, agent: &mut Agent) {
        if let Some(name) = self.name {
            agent.name = name.trim().to_string();
        }
    }
}

/// Bumps a `vX.Y` version by one tenth (`v1.9` -> `v2.0`). `None` if not in that form
/// or if the major version would overflow.
pub fn bump_version(version: &str) -> Option<String> {
    let rest = version.strip_prefix('v')?;
    let (major, minor) = rest.split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor: u32 = minor.parse().ok()?;
    if minor > 9 {
        return None;
    }
    let tenths = major.checked_mul(10)?.checked_add(minor + 1)?;
    Some(format!("v{}.{}", tenths / 10, tenths % 10))
}
