// Simulated DNS/SSL bindings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DomainId, Patch, WorkspaceId};

/// SSL certificate state; serializes to lowercase JSON (e.g. "pending").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslStatus {
    Active,
    Pending,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsType {
    A,
    Aaaa,
    Cname,
    Txt,
}

/// Bound to a container by name within the same workspace, not by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: DomainId,
    pub domain: String,
    pub ssl_status: SslStatus,
    pub container_name: String,
    pub dns_type: DnsType,
    pub dns_value: String,
    pub workspace_id: WorkspaceId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Domain {
    /// Active certificate whose expiry lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.ssl_status == SslStatus::Active && self.expires_at < now
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDomain {
    pub domain: String,
    pub container_name: String,
    pub dns_type: DnsType,
    pub dns_value: String,
    pub workspace_id: WorkspaceId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainPatch {
    pub container_name: Option<String>,
    pub dns_type: Option<DnsType>,
    pub dns_value: Option<String>,
}

impl Patch<Domain> for DomainPatch {
    fn apply(self, domain: &mut Domain) {
        if let Some(container_name) = self.container_name {
            domain.container_name = container_name.trim().to_string();
        }
        if let Some(dns_type) = self.dns_type {
            domain.dns_type = dns_type;
        }
        if let Some(dns_value) = self.dns_value {
            domain.dns_value = dns_value.trim().to_string();
        }
    }
}
