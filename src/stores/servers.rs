// Server lifecycle: start/stop/restart and telemetry jitter

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use super::EntityStore;
use crate::models::{NewServer, Server, ServerId, ServerStatus};
use crate::telemetry::{self, CPU_JITTER, RAM_JITTER, SERVER_CPU_START, SERVER_RAM_START};

impl EntityStore<Server> {
    /// New servers start offline with no agent; IP and OS are randomized.
    pub async fn create(&self, new: NewServer) -> Server {
        let server = {
            let mut rng = rand::rng();
            Server {
                id: ServerId::generate(),
                name: new.name.trim().to_string(),
                region: new.region.trim().to_string(),
                status: ServerStatus::Offline,
                agent_connected: false,
                cpu_usage: 0.0,
                ram_usage: 0.0,
                ip: telemetry::random_ip(&mut rng),
                os: telemetry::random_os(&mut rng),
                workspace_id: new.workspace_id,
                created_at: Utc::now(),
            }
        };
        info!(server_id = %server.id, name = %server.name, region = %server.region, "server created");
        self.insert(server).await
    }

    pub async fn start(&self, id: &ServerId) -> Option<Server> {
        self.modify_cancelling(id, bring_online).await
    }

    pub async fn stop(&self, id: &ServerId) -> Option<Server> {
        self.modify_cancelling(id, take_offline).await
    }

    /// Offline immediately, back online after `delay`. A second restart resets the delay.
    pub async fn restart(self: &Arc<Self>, id: &ServerId, delay: Duration) -> Option<Server> {
        let store = Arc::clone(self);
        let target = id.clone();
        let completion = async move {
            let done = store
                .modify(&target, |s| {
                    if s.status == ServerStatus::Offline {
                        bring_online(s);
                    }
                })
                .await;
            if done.is_some() {
                debug!(server_id = %target, "server restart complete");
            }
        };
        self.modify_scheduling(id, take_offline, delay, completion)
            .await
    }

    /// One jitter tick over online servers. Returns how many changed.
    pub async fn jitter_telemetry(&self) -> usize {
        let mut items = self.items.write().await;
        let mut rng = rand::rng();
        let mut changed = 0;
        for s in items.iter_mut().filter(|s| s.is_online()) {
            s.cpu_usage = telemetry::jitter(&mut rng, s.cpu_usage, CPU_JITTER);
            s.ram_usage = telemetry::jitter(&mut rng, s.ram_usage, RAM_JITTER);
            changed += 1;
        }
        if changed > 0 {
            self.mirror(&items);
        }
        changed
    }
}

fn take_offline(s: &mut Server) {
    s.status = ServerStatus::Offline;
    s.agent_connected = false;
    s.cpu_usage = 0.0;
    s.ram_usage = 0.0;
}

fn bring_online(s: &mut Server) {
    let mut rng = rand::rng();
    s.status = ServerStatus::Online;
    s.agent_connected = true;
    s.cpu_usage = telemetry::random_usage(&mut rng, SERVER_CPU_START);
    s.ram_usage = telemetry::random_usage(&mut rng, SERVER_RAM_START);
}
