use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use service::{AuthError, SnapshotError};

/// JSON envelope of every operation reply: `{"Error": "...", "Data": ...}`.
#[derive(Debug, Serialize)]
pub struct Reply<T: Serialize> {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Data")]
    pub data: Option<T>,
}

impl<T: Serialize> Reply<T> {
    pub fn ok(data: T) -> Self { Self { error: String::new(), data: Some(data) } }
}

impl Reply<()> {
    pub fn empty() -> Self { Self { error: String::new(), data: None } }
    pub fn err(msg: impl Into<String>) -> Self { Self { error: msg.into(), data: None } }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    /// Failure of the administrator credentials on an admin-gated call.
    #[error("{0}")]
    AdminGate(AuthError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AdminGate(AuthError::RoleNotFound { .. }) => StatusCode::FORBIDDEN,
            ApiError::AdminGate(_) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::UserNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Auth(AuthError::RoleNotFound { .. }) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::UserNotUnique { .. }) => StatusCode::CONFLICT,
            ApiError::Auth(AuthError::LoginFailed { .. }) => StatusCode::UNAUTHORIZED,
            ApiError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable numeric code for logging; 0 when the error is not an auth failure.
    pub fn code(&self) -> u16 {
        match self {
            ApiError::AdminGate(e) | ApiError::Auth(e) => e.code(),
            _ => 0,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(Reply::err(self.to_string()))).into_response()
    }
}

/// Turn an operation result into a reply, logging failures with the operation name.
pub fn respond<T: Serialize>(op: &'static str, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(Reply::ok(data))).into_response(),
        Err(e) => {
            warn!(op, code = e.code(), status = e.status().as_u16(), error = %e, "request failed");
            e.into_response()
        }
    }
}

/// Like [`respond`] for operations that carry no data.
pub fn respond_empty(op: &'static str, result: Result<(), ApiError>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(Reply::empty())).into_response(),
        Err(e) => respond::<()>(op, Err(e)),
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl StartupError {
    /// Process exit status; snapshot failures use 3.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Snapshot(_) => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gate_failures_are_auth_statuses() {
        let e = ApiError::AdminGate(AuthError::UserNotFound { user: "x".into() });
        assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        let e = ApiError::AdminGate(AuthError::RoleNotFound { user: "x".into(), role: "auth.admin".into() });
        assert_eq!(e.status(), StatusCode::FORBIDDEN);
        assert_eq!(e.to_string(), "the user (x) does not have the role (auth.admin)");
    }

    #[test]
    fn reply_serializes_envelope() -> anyhow::Result<()> {
        let ok = serde_json::to_value(Reply::ok(vec!["ops"]))?;
        assert_eq!(ok, serde_json::json!({"Error": "", "Data": ["ops"]}));
        let err = serde_json::to_value(Reply::err("login failed for user (a)"))?;
        assert_eq!(err, serde_json::json!({"Error": "login failed for user (a)", "Data": null}));
        Ok(())
    }
}
