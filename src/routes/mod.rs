// HTTP + WebSocket routes over the simulated dashboard

mod agents;
mod containers;
mod domains;
mod http;
mod servers;
mod tokens;
mod workspaces;
mod ws;

use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::dashboard::Dashboard;
use crate::models::TelemetrySnapshot;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) dashboard: Arc<Dashboard>,
    pub(crate) telemetry_tx: broadcast::Sender<TelemetrySnapshot>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
}

pub fn app(
    dashboard: Arc<Dashboard>,
    telemetry_tx: broadcast::Sender<TelemetrySnapshot>,
    ws_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        dashboard,
        telemetry_tx,
        ws_connections,
    };
    Router::new()
        .route("/", get(|| async { crate::version::banner() })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route(
            "/api/workspaces",
            get(workspaces::list).post(workspaces::create),
        )
        .route(
            "/api/workspaces/active",
            get(workspaces::get_active).put(workspaces::set_active),
        )
        .route(
            "/api/workspaces/{id}",
            patch(workspaces::update).delete(workspaces::delete),
        )
        .route("/api/workspaces/{id}/servers", get(servers::list))
        .route("/api/workspaces/{id}/containers", get(containers::list))
        .route("/api/workspaces/{id}/domains", get(domains::list))
        .route("/api/workspaces/{id}/agents", get(agents::list))
        .route("/api/servers", post(servers::create))
        .route(
            "/api/servers/{id}",
            patch(servers::update).delete(servers::delete),
        )
        .route("/api/servers/{id}/start", post(servers::start))
        .route("/api/servers/{id}/stop", post(servers::stop))
        .route("/api/servers/{id}/restart", post(servers::restart))
        .route("/api/containers", post(containers::create))
        .route(
            "/api/containers/{id}",
            patch(containers::update).delete(containers::delete),
        )
        .route("/api/containers/{id}/start", post(containers::start))
        .route("/api/containers/{id}/stop", post(containers::stop))
        .route("/api/containers/{id}/restart", post(containers::restart))
        .route("/api/domains", post(domains::create))
        .route(
            "/api/domains/{id}",
            patch(domains::update).delete(domains::delete),
        )
        .route("/api/domains/{id}/renew-ssl", post(domains::renew_ssl))
        .route("/api/agents", post(agents::create))
        .route(
            "/api/agents/{id}",
            patch(agents::update).delete(agents::delete),
        )
        .route("/api/agents/{id}/start", post(agents::start))
        .route("/api/agents/{id}/stop", post(agents::stop))
        .route("/api/agents/{id}/restart", post(agents::restart))
        .route(
            "/api/agents/{id}/update-version",
            post(agents::update_version),
        )
        .route("/api/tokens", get(tokens::list).post(tokens::create))
        .route("/api/tokens/{id}", axum::routing::delete(tokens::revoke))
        .route("/ws/telemetry", get(ws::ws_telemetry)) // WS /ws/telemetry
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
