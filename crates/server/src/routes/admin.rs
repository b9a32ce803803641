//! Admin-gated operations. Each handler opens an admin scope, which checks the
//! administrator's credentials and keeps the table locked for the mutation.

use axum::{body::Bytes, extract::State, response::Response};

use service::auth::{AdminScope, CredentialTable, SecretKey, UserKey};

use crate::errors::{respond, respond_empty, ApiError};
use crate::forms::{decode, LoginForm, ModifyRoleForm, ModifyUserForm};
use crate::routes::auth::ServerState;

fn with_admin<T>(
    state: &ServerState,
    user: &UserKey,
    secret: &SecretKey,
    f: impl FnOnce(&mut AdminScope<'_>) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let mut scope = state.store.admin(user, secret).map_err(ApiError::AdminGate)?;
    f(&mut scope)
}

/// Admin `{User, Secret}` -> copy of the whole table.
pub async fn dump(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<LoginForm>(&body)
        .and_then(|form| with_admin(&state, &form.user, &form.secret, |scope| Ok::<CredentialTable, ApiError>(scope.dump())));
    respond("authDump", result)
}

pub async fn change_secret(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<ModifyUserForm>(&body).and_then(|form| {
        with_admin(&state, &form.admin_user, &form.admin_secret, |scope| {
            Ok(scope.change_secret(&form.user, form.secret)?)
        })
    });
    respond_empty("authChangeSecret", result)
}

pub async fn add_user(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<ModifyUserForm>(&body).and_then(|form| {
        with_admin(&state, &form.admin_user, &form.admin_secret, |scope| {
            Ok(scope.add_user(form.user, form.secret, form.roles.unwrap_or_default())?)
        })
    });
    respond_empty("authAddUser", result)
}

pub async fn delete_user(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<ModifyUserForm>(&body).and_then(|form| {
        with_admin(&state, &form.admin_user, &form.admin_secret, |scope| Ok(scope.delete_user(&form.user)?))
    });
    respond_empty("authDeleteUser", result)
}

pub async fn add_role(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<ModifyRoleForm>(&body).and_then(|form| {
        with_admin(&state, &form.admin_user, &form.admin_secret, |scope| Ok(scope.add_role(&form.user, form.role)?))
    });
    respond_empty("authAddRole", result)
}

pub async fn delete_role(State(state): State<ServerState>, body: Bytes) -> Response {
    let result = decode::<ModifyRoleForm>(&body).and_then(|form| {
        with_admin(&state, &form.admin_user, &form.admin_secret, |scope| {
            Ok(scope.delete_role(&form.user, &form.role)?)
        })
    });
    respond_empty("authDeleteRole", result)
}
