// API token endpoints. Tokens are masked unless `?reveal=true`.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::AppState;
use crate::error::Result;
use crate::models::{TokenId, TokenView};

#[derive(Deserialize)]
pub(super) struct ListQuery {
    #[serde(default)]
    reveal: bool,
}

#[derive(Deserialize)]
pub(super) struct CreateToken {
    name: String,
}

pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<TokenView>> {
    let tokens = state.dashboard.tokens.all().await;
    Json(tokens.iter().map(|t| t.view(query.reveal)).collect())
}

/// The full token is returned once at creation.
pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateToken>,
) -> Result<(StatusCode, Json<TokenView>)> {
    let token = state.dashboard.generate_token(&body.name).await?;
    Ok((StatusCode::CREATED, Json(token.view(true))))
}

pub(super) async fn revoke(
    State(state): State<AppState>,
    Path(id): Path<TokenId>,
) -> Result<StatusCode> {
    state.dashboard.revoke_token(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
