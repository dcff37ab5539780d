// Domain endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::AppState;
use crate::error::{Error, Result};
use crate::models::{Domain, DomainId, DomainPatch, NewDomain, WorkspaceId};

pub(super) async fn list(
    State(state): State<AppState>,
    Path(workspace_id): Path<WorkspaceId>,
) -> Json<Vec<Domain>> {
    Json(
        state
            .dashboard
            .domains
            .get_all_by_workspace(&workspace_id)
            .await,
    )
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewDomain>,
) -> Result<(StatusCode, Json<Domain>)> {
    let domain = state.dashboard.create_domain(body).await?;
    Ok((StatusCode::CREATED, Json(domain)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<DomainId>,
    Json(patch): Json<DomainPatch>,
) -> Result<Json<Domain>> {
    Ok(Json(state.dashboard.update_domain(&id, patch).await?))
}

pub(super) async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DomainId>,
) -> Result<Json<Domain>> {
    state
        .dashboard
        .domains
        .delete(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub(super) async fn renew_ssl(
    State(state): State<AppState>,
    Path(id): Path<DomainId>,
) -> Result<(StatusCode, Json<Domain>)> {
    let domain = state
        .dashboard
        .renew_ssl(&id)
        .await
        .ok_or_else(|| not_found(&id))?;
    Ok((StatusCode::ACCEPTED, Json(domain)))
}

fn not_found(id: &DomainId) -> Error {
    Error::DomainNotFound(id.to_string())
}
