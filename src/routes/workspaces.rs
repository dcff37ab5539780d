// Workspace endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::AppState;
use crate::error::{Error, Result};
use crate::models::{Workspace, WorkspaceId, WorkspacePatch};

#[derive(Deserialize)]
pub(super) struct CreateWorkspace {
    name: String,
    #[serde(default)]
    seed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SetActive {
    workspace_id: WorkspaceId,
}

pub(super) async fn list(State(state): State<AppState>) -> Json<Vec<Workspace>> {
    Json(state.dashboard.workspaces.all().await)
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateWorkspace>,
) -> Result<(StatusCode, Json<Workspace>)> {
    let ws = state
        .dashboard
        .create_workspace(&body.name, body.seed)
        .await?;
    Ok((StatusCode::CREATED, Json(ws)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<WorkspaceId>,
    Json(patch): Json<WorkspacePatch>,
) -> Result<Json<Workspace>> {
    if let Some(name) = &patch.name {
        crate::validate::name("workspace name", name, 1)?;
    }
    let workspaces = &state.dashboard.workspaces;
    if !workspaces.update(&id, patch).await {
        return Err(Error::WorkspaceNotFound(id.to_string()));
    }
    workspaces
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| Error::WorkspaceNotFound(id.to_string()))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<WorkspaceId>,
) -> Result<Json<Workspace>> {
    Ok(Json(state.dashboard.delete_workspace(&id).await?))
}

pub(super) async fn get_active(State(state): State<AppState>) -> Json<Option<Workspace>> {
    Json(state.dashboard.active_workspace().await)
}

pub(super) async fn set_active(
    State(state): State<AppState>,
    Json(body): Json<SetActive>,
) -> Result<StatusCode> {
    state
        .dashboard
        .set_active_workspace(&body.workspace_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
