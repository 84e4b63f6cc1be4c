//! Upload protocol routes.
//!
//! Direct path: `POST .../upload/presigned`, client PUTs to storage, then
//! `POST .../upload/confirm`. Fallback: one multipart `POST .../upload` that
//! the server writes through to storage.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::Field},
    http::StatusCode,
    routing::post,
};
use bytes::BytesMut;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ApiError, AppState, middleware::AuthUser};
use docket_core::upload::IncomingFile;
use docket_shared::AppError;
use docket_shared::upload::{
    ConfirmRequest, DeleteFileRequest, DeleteFileResponse, PresignRequest, PresignResponse,
    UploadMeta, UploadResponse, total_size,
};

/// Room for multipart boundaries and the `meta` part on top of file bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Creates the upload routes. `max_server_upload_bytes` caps the multipart
/// fallback.
pub fn routes(max_server_upload_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_server_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/targets/{target_id}/upload/presigned", post(request_grants))
        .route("/targets/{target_id}/upload/confirm", post(confirm_upload))
        .route(
            "/targets/{target_id}/upload",
            post(server_upload)
                .delete(delete_file)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// POST `/targets/{target_id}/upload/presigned`
/// Issue one presigned PUT per file. Nothing is persisted.
async fn request_grants(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
    Json(payload): Json<PresignRequest>,
) -> Result<Json<PresignResponse>, ApiError> {
    let grants = state
        .upload_service()?
        .issue_grants(target_id, auth.user_id(), &payload.files)
        .await?;

    info!(
        %target_id,
        user_id = %auth.user_id(),
        files = grants.len(),
        bytes = total_size(&payload.files),
        "Upload grants issued"
    );

    Ok(Json(PresignResponse {
        presigned_urls: grants,
        message: "Presigned URLs generated successfully".to_string(),
    }))
}

/// POST `/targets/{target_id}/upload/confirm`
/// Record files the client stored directly.
async fn confirm_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let outcome = state
        .upload_service()?
        .confirm(target_id, auth.user_id(), payload.uploaded_files)
        .await?;

    info!(
        %target_id,
        user_id = %auth.user_id(),
        appended = outcome.appended.len(),
        status = %outcome.target.status,
        "Direct upload confirmed"
    );

    Ok(Json(UploadResponse {
        message: "Files confirmed and stored successfully".to_string(),
        target: outcome.target,
        uploaded_files: outcome.appended,
    }))
}

/// POST `/targets/{target_id}/upload`
/// Server-mediated upload: `files` parts (or a single `file`), plus an
/// optional `meta` JSON part.
async fn server_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let service = state.upload_service()?;
    let files = read_parts(multipart, service.max_server_upload_bytes()).await?;

    let outcome = service
        .upload_via_server(target_id, auth.user_id(), files)
        .await?;

    info!(
        %target_id,
        user_id = %auth.user_id(),
        appended = outcome.appended.len(),
        status = %outcome.target.status,
        "Server-mediated upload stored"
    );

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully".to_string(),
        target: outcome.target,
        uploaded_files: outcome.appended,
    }))
}

/// DELETE `/targets/{target_id}/upload`
async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(target_id): Path<Uuid>,
    Json(payload): Json<DeleteFileRequest>,
) -> Result<Json<DeleteFileResponse>, ApiError> {
    let target = state
        .upload_service()?
        .remove_file(target_id, auth.user_id(), &payload.file_url)
        .await?;

    info!(%target_id, user_id = %auth.user_id(), file_url = %payload.file_url, "File removed");

    Ok(Json(DeleteFileResponse {
        message: "File deleted successfully".to_string(),
        target,
    }))
}

/// Collect file parts, enforcing `max_bytes` across all of them.
async fn read_parts(
    mut multipart: Multipart,
    max_bytes: u64,
) -> Result<Vec<IncomingFile>, ApiError> {
    let mut files = Vec::new();
    let mut singles = Vec::new();
    let mut meta = UploadMeta::default();
    let mut total: u64 = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e.body_text(), e.status(), total, max_bytes))?
    {
        match field.name() {
            Some("files") => files.push(read_file(field, &mut total, max_bytes).await?),
            Some("file") => singles.push(read_file(field, &mut total, max_bytes).await?),
            Some("meta") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&e.body_text(), e.status(), total, max_bytes))?;
                meta = serde_json::from_str(&text)
                    .map_err(|e| AppError::Validation(format!("meta is not valid JSON: {e}")))?;
            }
            other => {
                warn!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    if files.is_empty() {
        files = singles;
    }
    if files.is_empty() {
        return Err(AppError::Validation("No files provided".to_string()).into());
    }

    // `meta` fills in names and types the parts did not carry.
    for (file, described) in files.iter_mut().zip(meta.files) {
        if file.file_name.is_empty() {
            file.file_name = described.file_name;
        }
        if file.file_type.is_empty() {
            file.file_type = described.file_type;
        }
    }
    for file in &mut files {
        if file.file_name.is_empty() {
            file.file_name = format!("upload-{}", chrono::Utc::now().timestamp_millis());
        }
        if file.file_type.is_empty() {
            file.file_type = "application/octet-stream".to_string();
        }
    }

    Ok(files)
}

async fn read_file(
    mut field: Field<'_>,
    total: &mut u64,
    max_bytes: u64,
) -> Result<IncomingFile, ApiError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let file_type = field.content_type().unwrap_or_default().to_string();

    let mut data = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(&e.body_text(), e.status(), *total, max_bytes))?
    {
        *total = total.saturating_add(chunk.len() as u64);
        if *total > max_bytes {
            return Err(AppError::PayloadTooLarge {
                size: *total,
                max: max_bytes,
            }
            .into());
        }
        data.extend_from_slice(&chunk);
    }

    Ok(IncomingFile {
        file_name,
        file_type,
        data: data.freeze(),
    })
}

fn multipart_error(text: &str, status: StatusCode, seen: u64, max_bytes: u64) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge {
            size: seen.max(max_bytes.saturating_add(1)),
            max: max_bytes,
        }
        .into();
    }
    AppError::Validation(format!("Invalid multipart body: {text}")).into()
}
