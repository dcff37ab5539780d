// Agent endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::AppState;
use crate::error::{Error, Result};
use crate::models::{Agent, AgentId, AgentPatch, NewAgent, WorkspaceId};

pub(super) async fn list(
    State(state): State<AppState>,
    Path(workspace_id): Path<WorkspaceId>,
) -> Json<Vec<Agent>> {
    Json(
        state
            .dashboard
            .agents
            .get_all_by_workspace(&workspace_id)
            .await,
    )
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewAgent>,
) -> Result<(StatusCode, Json<Agent>)> {
    let agent = state.dashboard.create_agent(body).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<AgentId>,
    Json(patch): Json<AgentPatch>,
) -> Result<Json<Agent>> {
    if let Some(name) = &patch.name {
        crate::validate::name("agent name", name, 2)?;
    }
    let agents = &state.dashboard.agents;
    if !agents.update(&id, patch).await {
        return Err(not_found(&id));
    }
    agents.get(&id).await.map(Json).ok_or_else(|| not_found(&id))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<AgentId>,
) -> Result<Json<Agent>> {
    state
        .dashboard
        .agents
        .delete(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub(super) async fn start(
    State(state): State<AppState>,
    Path(id): Path<AgentId>,
) -> Result<Json<Agent>> {
    state
        .dashboard
        .agents
        .start(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub(super) async fn stop(
    State(state): State<AppState>,
    Path(id): Path<AgentId>,
) -> Result<Json<Agent>> {
    state
        .dashboard
        .agents
        .stop(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub(super) async fn restart(
    State(state): State<AppState>,
    Path(id): Path<AgentId>,
) -> Result<(StatusCode, Json<Agent>)> {
    let agent = state
        .dashboard
        .restart_agent(&id)
        .await
        .ok_or_else(|| not_found(&id))?;
    Ok((StatusCode::ACCEPTED, Json(agent)))
}

pub(super) async fn update_version(
    State(state): State<AppState>,
    Path(id): Path<AgentId>,
) -> Result<Json<Agent>> {
    let agents = &state.dashboard.agents;
    let current = agents.get(&id).await.ok_or_else(|| not_found(&id))?;
    agents.update_version(&id).await.map(Json).ok_or_else(|| {
        Error::InvalidParameter(format!(
            "agent version {:?} is not in vX.Y form",
            current.version
        ))
    })
}

fn not_found(id: &AgentId) -> Error {
    Error::AgentNotFound(id.to_string())
}
