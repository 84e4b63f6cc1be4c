//! Target management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::{ApiError, AppState, middleware::AuthUser};
use docket_shared::target::{CreateTargetRequest, Target, TargetListQuery, UpdateTargetRequest};

/// Creates the target routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/targets", get(list_targets).post(create_target))
        .route(
            "/targets/{target_id}",
            get(get_target).put(update_target).delete(delete_target),
        )
}

/// GET `/targets?status=` - the caller's targets, newest first.
async fn list_targets(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TargetListQuery>,
) -> Result<Json<Vec<Target>>, ApiError> {
    let targets = state.target_service().list(auth.user_id(), query).await?;
    Ok(Json(targets))
}

/// POST `/targets`
async fn create_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTargetRequest>,
) -> Result<(StatusCode, Json<Target>), ApiError> {
    let target = state.target_service().create(auth.user_id(), payload).await?;

    info!(
        target_id = %target.id,
        user_id = %auth.user_id(),
        assigned_to = %target.assigned_to,
        document_count = target.document_count,
        "Target created"
    );

    Ok((StatusCode::CREATED, Json(target)))
}

/// GET `/targets/{target_id}`
async fn get_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<Json<Target>, ApiError> {
    let target = state.target_service().get(target_id, auth.user_id()).await?;
    Ok(Json(target))
}

/// PUT `/targets/{target_id}` - partial update.
async fn update_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
    Json(payload): Json<UpdateTargetRequest>,
) -> Result<Json<Target>, ApiError> {
    let target = state
        .target_service()
        .update(target_id, auth.user_id(), payload)
        .await?;

    info!(%target_id, user_id = %auth.user_id(), status = %target.status, "Target updated");
    Ok(Json(target))
}

/// DELETE `/targets/{target_id}`
///
/// File rows go with the target; stored objects are removed best-effort.
async fn delete_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let target = state
        .target_service()
        .delete(target_id, auth.user_id())
        .await?;

    if !target.files.is_empty() {
        if let Ok(uploads) = state.upload_service() {
            uploads.purge_objects(&target).await;
        }
    }

    info!(%target_id, user_id = %auth.user_id(), files = target.files.len(), "Target deleted");
    Ok(Json(json!({ "message": "Target deleted successfully" })))
}
