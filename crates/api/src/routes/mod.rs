//! API route definitions.

use axum::{Router, middleware};

use crate::{
    AppState,
    middleware::auth::{auth_middleware, auth_middleware_with_query},
};

pub mod auth;
pub mod files;
pub mod health;
pub mod targets;
pub mod uploads;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(targets::routes())
        .merge(uploads::routes(state.max_server_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Opened from links, so the token may ride in the query string.
    let file_routes = files::routes().layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware_with_query,
    ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
        .merge(file_routes)
}
