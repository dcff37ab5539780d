// Server endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::AppState;
use crate::error::{Error, Result};
use crate::models::{NewServer, Server, ServerId, ServerPatch, WorkspaceId};

pub(super) async fn list(
    State(state): State<AppState>,
    Path(workspace_id): Path<WorkspaceId>,
) -> Json<Vec<Server>> {
    Json(
        state
            .dashboard
            .servers
            .get_all_by_workspace(&workspace_id)
            .await,
    )
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewServer>,
) -> Result<(StatusCode, Json<Server>)> {
    let server = state.dashboard.create_server(body).await?;
    Ok((StatusCode::CREATED, Json(server)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
    Json(patch): Json<ServerPatch>,
) -> Result<Json<Server>> {
    if let Some(name) = &patch.name {
        crate::validate::name("server name", name, 2)?;
    }
    let servers = &state.dashboard.servers;
    if !servers.update(&id, patch).await {
        return Err(not_found(&id));
    }
    servers.get(&id).await.map(Json).ok_or_else(|| not_found(&id))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
) -> Result<Json<Server>> {
    Ok(Json(state.dashboard.delete_server(&id).await?))
}

pub(super) async fn start(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
) -> Result<Json<Server>> {
    state
        .dashboard
        .servers
        .start(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub(super) async fn stop(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
) -> Result<Json<Server>> {
    state
        .dashboard
        .servers
        .stop(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// 202: the server is offline now and comes back after the restart delay.
pub(super) async fn restart(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
) -> Result<(StatusCode, Json<Server>)> {
    let server = state
        .dashboard
        .restart_server(&id)
        .await
        .ok_or_else(|| not_found(&id))?;
    Ok((StatusCode::ACCEPTED, Json(server)))
}

fn not_found(id: &ServerId) -> Error {
    Error::ServerNotFound(id.to_string())
}
