// Container lifecycle: start/stop/restart and telemetry jitter

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use super::EntityStore;
use crate::models::{Container, ContainerId, ContainerStatus, NewContainer};
use crate::telemetry::{self, CONTAINER_CPU_START, CONTAINER_RAM_START, CPU_JITTER, RAM_JITTER};

impl EntityStore<Container> {
    /// New containers come up running. `server_name` is a copy taken now.
    pub async fn create(&self, new: NewContainer, server_name: &str) -> Container {
        let container = {
            let mut rng = rand::rng();
            Container {
                id: ContainerId::generate(),
                name: new.name.trim().to_string(),
                image: new.image.trim().to_string(),
                port: new.port.trim().to_string(),
                status: ContainerStatus::Running,
                server_id: new.server_id,
                server_name: server_name.to_string(),
                workspace_id: new.workspace_id,
                cpu_usage: telemetry::random_usage(&mut rng, CONTAINER_CPU_START),
                ram_usage: telemetry::random_usage(&mut rng, CONTAINER_RAM_START),
                created_at: Utc::now(),
            }
        };
        info!(container_id = %container.id, name = %container.name, image = %container.image, "container created");
        self.insert(container).await
    }

    pub async fn start(&self, id: &ContainerId) -> Option<Container> {
        self.modify_cancelling(id, bring_up).await
    }

    pub async fn stop(&self, id: &ContainerId) -> Option<Container> {
        self.modify_cancelling(id, |c| {
            c.status = ContainerStatus::Stopped;
            c.cpu_usage = 0.0;
            c.ram_usage = 0.0;
        })
        .await
    }

    /// `restarting` immediately, `running` with fresh usage after `delay`.
    pub async fn restart(self: &Arc<Self>, id: &ContainerId, delay: Duration) -> Option<Container> {
        let store = Arc::clone(self);
        let target = id.clone();
        let completion = async move {
            let done = store
                .modify(&target, |c| {
                    if c.status == ContainerStatus::Restarting {
                        bring_up(c);
                    }
                })
                .await;
            if done.is_some() {
                debug!(container_id = %target, "container restart complete");
            }
        };
        self.modify_scheduling(
            id,
            |c| {
                c.status = ContainerStatus::Restarting;
                c.cpu_usage = 0.0;
                c.ram_usage = 0.0;
            },
            delay,
            completion,
        )
        .await
    }

    /// Containers running on the given server.
    pub async fn on_server(&self, server_id: &crate::models::ServerId) -> Vec<Container> {
        self.find_all(|c| &c.server_id == server_id).await
    }

    pub async fn jitter_telemetry(&self) -> usize {
        let mut items = self.items.write().await;
        let mut rng = rand::rng();
        let mut changed = 0;
        for c in items.iter_mut().filter(|c| c.is_running()) {
            c.cpu_usage = telemetry::jitter(&mut rng, c.cpu_usage, CPU_JITTER);
            c.ram_usage = telemetry::jitter(&mut rng, c.ram_usage, RAM_JITTER);
            changed += 1;
        }
        if changed > 0 {
            self.mirror(&items);
        }
        changed
    }
}

fn bring_up(c: &mut Container) {
    let mut rng = rand::rng();
    c.status = ContainerStatus::Running;
    c.cpu_usage = telemetry::random_usage(&mut rng, CONTAINER_CPU_START);
    c.ram_usage = telemetry::random_usage(&mut rng, CONTAINER_RAM_START);
}
