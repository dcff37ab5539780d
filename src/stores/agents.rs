// Agent lifecycle, version updates and fake heartbeats

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::EntityStore;
use crate::models::{Agent, AgentId, AgentStatus, INITIAL_AGENT_VERSION, NewAgent, bump_version};
use crate::telemetry::{self, AGENT_CPU_START, AGENT_RAM_START, CPU_JITTER, RAM_JITTER};

impl EntityStore<Agent> {
    /// New agents report in immediately at the initial version.
    pub async fn create(&self, new: NewAgent, server_name: &str) -> Agent {
        let agent = {
            let mut rng = rand::rng();
            Agent {
                id: AgentId::generate(),
                name: new.name.trim().to_string(),
                status: AgentStatus::Online,
                last_heartbeat: telemetry::format_heartbeat(0),
                version: INITIAL_AGENT_VERSION.to_string(),
                server_id: new.server_id,
                server_name: server_name.to_string(),
                workspace_id: new.workspace_id,
                cpu_usage: telemetry::random_usage(&mut rng, AGENT_CPU_START),
                ram_usage: telemetry::random_usage(&mut rng, AGENT_RAM_START),
                created_at: Utc::now(),
            }
        };
        info!(agent_id = %agent.id, name = %agent.name, server = %agent.server_name, "agent created");
        self.insert(agent).await
    }

    pub async fn start(&self, id: &AgentId) -> Option<Agent> {
        self.modify_cancelling(id, bring_online).await
    }

    pub async fn stop(&self, id: &AgentId) -> Option<Agent> {
        self.modify_cancelling(id, take_offline).await
    }

    pub async fn restart(self: &Arc<Self>, id: &AgentId, delay: Duration) -> Option<Agent> {
        let store = Arc::clone(self);
        let target = id.clone();
        let completion = async move {
            let done = store
                .modify(&target, |a| {
                    if a.status == AgentStatus::Offline {
                        bring_online(a);
                    }
                })
                .await;
            if done.is_some() {
                debug!(agent_id = %target, "agent restart complete");
            }
        };
        self.modify_scheduling(id, take_offline, delay, completion)
            .await
    }

    /// Bumps `vX.Y` by 0.1. `None` if the agent is unknown or its version is not in that form.
    pub async fn update_version(&self, id: &AgentId) -> Option<Agent> {
        let current = self.get(id).await?;
        let Some(next) = bump_version(&current.version) else {
            warn!(agent_id = %id, version = %current.version, "unrecognized agent version; not updated");
            return None;
        };
        let updated = self.modify(id, |a| a.version = next).await;
        if let Some(a) = &updated {
            info!(agent_id = %id, version = %a.version, "agent updated");
        }
        updated
    }

    pub async fn on_server(&self, server_id: &crate::models::ServerId) -> Vec<Agent> {
        self.find_all(|a| &a.server_id == server_id).await
    }

    /// Jitters usage and regenerates the heartbeat string of online agents.
    pub async fn jitter_telemetry(&self) -> usize {
        let mut items = self.items.write().await;
        let mut rng = rand::rng();
        let mut changed = 0;
        for a in items.iter_mut().filter(|a| a.is_online()) {
            a.cpu_usage = telemetry::jitter(&mut rng, a.cpu_usage, CPU_JITTER);
            a.ram_usage = telemetry::jitter(&mut rng, a.ram_usage, RAM_JITTER);
            a.last_heartbeat = telemetry::random_heartbeat(&mut rng);
            changed += 1;
        }
        if changed > 0 {
            self.mirror(&items);
        }
        changed
    }
}

fn bring_online(a: &mut Agent) {
    let mut rng = rand::rng();
    a.status = AgentStatus::Online;
    a.last_heartbeat = telemetry::format_heartbeat(0);
    a.cpu_usage = telemetry::random_usage(&mut rng, AGENT_CPU_START);
    a.ram_usage = telemetry::random_usage(&mut rng, AGENT_RAM_START);
}

fn take_offline(a: &mut Agent) {
    a.status = AgentStatus::Offline;
    a.cpu_usage = 0.0;
    a.ram_usage = 0.0;
}
