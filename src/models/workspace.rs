// Workspace: top-level tenant grouping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Patch, WorkspaceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePatch {
    pub name: Option<String>,
}

impl Patch<Workspace> for WorkspacePatch {
    fn apply(self, ws: &mut Workspace) {
        if let Some(name) = self.name {
            ws.name = name.trim().to_string();
        }
    }
}
