// Entity models for the simulated infrastructure

mod agent;
mod container;
mod domain;
pub mod ids;
mod server;
mod snapshot;
mod token;
mod workspace;

pub use agent::{Agent, AgentPatch, AgentStatus, INITIAL_AGENT_VERSION, NewAgent, bump_version};
pub use container::{Container, ContainerPatch, ContainerStatus, NewContainer};
pub use domain::{DnsType, Domain, DomainPatch, NewDomain, SslStatus};
pub use ids::{AgentId, ContainerId, DomainId, ServerId, TokenId, WorkspaceId};
pub use server::{NewServer, Server, ServerPatch, ServerStatus};
pub use snapshot::TelemetrySnapshot;
pub use token::{ApiToken, TOKEN_PREFIX, TokenView, generate_token_secret, mask_token};
pub use workspace::{Workspace, WorkspacePatch};

/// Merges a partial update into an entity.
pub trait Patch<T> {
    fn apply(self, target: &mut T);
}
