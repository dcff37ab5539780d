// Container endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::AppState;
use crate::error::{Error, Result};
use crate::models::{Container, ContainerId, ContainerPatch, NewContainer, WorkspaceId};

pub(super) async fn list(
    State(state): State<AppState>,
    Path(workspace_id): Path<WorkspaceId>,
) -> Json<Vec<Container>> {
    Json(
        state
            .dashboard
            .containers
            .get_all_by_workspace(&workspace_id)
            .await,
    )
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewContainer>,
) -> Result<(StatusCode, Json<Container>)> {
    let container = state.dashboard.create_container(body).await?;
    Ok((StatusCode::CREATED, Json(container)))
}

/// Renaming carries bound domains along (409 under the restrict policy).
pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<ContainerId>,
    Json(patch): Json<ContainerPatch>,
) -> Result<Json<Container>> {
    Ok(Json(state.dashboard.update_container(&id, patch).await?))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ContainerId>,
) -> Result<Json<Container>> {
    Ok(Json(state.dashboard.delete_container(&id).await?))
}

pub(super) async fn start(
    State(state): State<AppState>,
    Path(id): Path<ContainerId>,
) -> Result<Json<Container>> {
    state
        .dashboard
        .containers
        .start(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub(super) async fn stop(
    State(state): State<AppState>,
    Path(id): Path<ContainerId>,
) -> Result<Json<Container>> {
    state
        .dashboard
        .containers
        .stop(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub(super) async fn restart(
    State(state): State<AppState>,
    Path(id): Path<ContainerId>,
) -> Result<(StatusCode, Json<Container>)> {
    let container = state
        .dashboard
        .restart_container(&id)
        .await
        .ok_or_else(|| not_found(&id))?;
    Ok((StatusCode::ACCEPTED, Json(container)))
}

fn not_found(id: &ContainerId) -> Error {
    Error::ContainerNotFound(id.to_string())
}
