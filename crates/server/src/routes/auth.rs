use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::Response};

use service::auth::{CredentialStore, RoleKey};

use crate::errors::{respond, ApiError};
use crate::forms::{decode, LoginForm, QueryForm};

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<CredentialStore>,
}

impl ServerState {
    pub fn new(store: Arc<CredentialStore>) -> Self { Self { store } }
}

pub async fn ping() -> &'static str { "pong" }

/// `{User, Secret}` -> the user's roles.
pub async fn login(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<LoginForm>(&body)
        .and_then(|form| state.store.authenticate(&form.user, &form.secret).map_err(ApiError::from));
    respond("authLogin", result)
}

/// `{User, Role}` -> the role, if the user holds it.
pub async fn query(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<QueryForm>(&body).and_then(|form| {
        state.store.authorize(&form.user, &form.role)?;
        Ok::<RoleKey, ApiError>(form.role)
    });
    respond("authQuery", result)
}
