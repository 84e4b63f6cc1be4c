//! `GET /health`: liveness plus what upload paths this instance offers.

use axum::{Json, Router, extract::State, routing::get};
use docket_core::storage::StorageService;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Storage provider name, absent when uploads are disabled.
    storage: Option<&'static str>,
    direct_upload: bool,
    max_server_upload_bytes: u64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = state.storage.as_deref();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        storage: storage.map(StorageService::provider_name),
        direct_upload: storage.is_some_and(StorageService::supports_presign),
        max_server_upload_bytes: state.max_server_upload_bytes,
    })
}

/// Public health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
