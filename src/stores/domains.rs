// Domain SSL lifecycle: pending -> active after a delay, active -> expired once past expiry

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::EntityStore;
use crate::models::{Domain, DomainId, NewDomain, SslStatus, WorkspaceId};

impl EntityStore<Domain> {
    /// Creates the binding with SSL `pending`; call [`Self::activate_after`] to schedule issuance.
    pub async fn create(&self, new: NewDomain, validity: chrono::Duration) -> Domain {
        let now = Utc::now();
        let domain = Domain {
            id: DomainId::generate(),
            domain: new.domain.trim().to_lowercase(),
            ssl_status: SslStatus::Pending,
            container_name: new.container_name.trim().to_string(),
            dns_type: new.dns_type,
            dns_value: new.dns_value.trim().to_string(),
            workspace_id: new.workspace_id,
            created_at: now,
            expires_at: now + validity,
        };
        info!(domain_id = %domain.id, domain = %domain.domain, "domain created");
        self.insert(domain).await
    }

    /// After `delay`, a still-pending certificate becomes active with a fresh expiry.
    pub async fn activate_after(
        self: &Arc<Self>,
        id: &DomainId,
        delay: Duration,
        validity: chrono::Duration,
    ) {
        let completion = self.issue_certificate(id, validity);
        self.transitions
            .schedule(id.as_str(), delay, completion)
            .await;
    }

    /// Back to `pending` now; active with a new expiry after `delay`.
    pub async fn renew_ssl(
        self: &Arc<Self>,
        id: &DomainId,
        delay: Duration,
        validity: chrono::Duration,
    ) -> Option<Domain> {
        let completion = self.issue_certificate(id, validity);
        self.modify_scheduling(id, |d| d.ssl_status = SslStatus::Pending, delay, completion)
            .await
    }

    fn issue_certificate(
        self: &Arc<Self>,
        id: &DomainId,
        validity: chrono::Duration,
    ) -> impl Future<Output = ()> + Send + use<> {
        let store = Arc::clone(self);
        let target = id.clone();
        async move {
            let now = Utc::now();
            let activated = store
                .modify(&target, |d| {
                    if d.ssl_status == SslStatus::Pending {
                        d.ssl_status = SslStatus::Active;
                        d.expires_at = now + validity;
                    }
                })
                .await;
            if activated.is_some() {
                debug!(domain_id = %target, "ssl certificate issued");
            }
        }
    }

    /// Marks active certificates whose expiry is before `now` as expired. Returns how many changed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired = self
            .modify_all(|d| {
                if d.is_expired_at(now) {
                    d.ssl_status = SslStatus::Expired;
                    true
                } else {
                    false
                }
            })
            .await;
        if expired > 0 {
            info!(expired, "ssl certificates expired");
        }
        expired
    }

    /// Domains bound to `container_name` inside the workspace.
    pub async fn bound_to(&self, workspace_id: &WorkspaceId, container_name: &str) -> Vec<Domain> {
        self.find_all(|d| &d.workspace_id == workspace_id && d.container_name == container_name)
            .await
    }

    pub async fn exists_named(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        self.items.read().await.iter().any(|d| d.domain == domain)
    }
}
