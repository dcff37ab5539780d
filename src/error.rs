// Domain errors for store and dashboard operations

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Server not found: {0}")]
    ServerNotFound(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("{entity} {id} has {dependents} dependent record(s)")]
    HasDependents {
        entity: &'static str,
        id: String,
        dependents: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn code(&self) -> u32 {
        match self {
            Error::WorkspaceNotFound(_) => 2001,
            Error::ServerNotFound(_) => 2002,
            Error::ContainerNotFound(_) => 2003,
            Error::DomainNotFound(_) => 2004,
            Error::AgentNotFound(_) => 2005,
            Error::TokenNotFound(_) => 2006,
            Error::HasDependents { .. } => 3001,
            Error::InvalidParameter(_) => 1001,
            Error::Internal(_) => 1000,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::WorkspaceNotFound(_)
            | Error::ServerNotFound(_)
            | Error::ContainerNotFound(_)
            | Error::DomainNotFound(_)
            | Error::AgentNotFound(_)
            | Error::TokenNotFound(_) => StatusCode::NOT_FOUND,
            Error::HasDependents { .. } => StatusCode::CONFLICT,
            Error::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: u32,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
