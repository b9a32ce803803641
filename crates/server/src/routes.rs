use axum::{
    routing::{any, post},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod admin;
pub mod auth;

use auth::ServerState;

/// Build the full application router: regular and admin-gated operations
pub fn build_router(state: ServerState) -> Router {
    let regular = Router::new()
        .route("/ping", any(auth::ping))
        .route("/auth/login", post(auth::login))
        .route("/auth/query", post(auth::query));

    let admin_routes = Router::new()
        .route("/auth/dump", post(admin::dump))
        .route("/auth/changeSecret", post(admin::change_secret))
        .route("/auth/addUser", post(admin::add_user))
        .route("/auth/deleteUser", post(admin::delete_user))
        .route("/auth/addRole", post(admin::add_role))
        .route("/auth/deleteRole", post(admin::delete_role));

    regular
        .merge(admin_routes)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
