//! Error-to-response mapping.
//!
//! Handlers return `Result<_, ApiError>`. The body is always
//! `{ "error": <code>, "message": <text> }`; quota errors also carry
//! `current`, `requested` and `max`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docket_core::auth::PasswordError;
use docket_core::target::TargetError;
use docket_core::upload::UploadError;
use docket_shared::{AppError, JwtError};
use sea_orm::DbErr;
use serde_json::json;
use tracing::{error, info};

/// Thin wrapper so `AppError` can implement `IntoResponse` here.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        Self(err.into())
    }
}

impl From<TargetError> for ApiError {
    fn from(err: TargetError) -> Self {
        Self(err.into())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if err.is_client_error() {
            info!(code = err.error_code(), error = %err, "Request rejected");
            client_message(&err)
        } else {
            error!(code = err.error_code(), error = %err, "Request failed");
            "An error occurred".to_string()
        };

        let body = match &err {
            AppError::QuotaExceeded {
                current,
                requested,
                max,
            } => json!({
                "error": err.error_code(),
                "message": message,
                "current": current,
                "requested": requested,
                "max": max,
            }),
            _ => json!({ "error": err.error_code(), "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Message without the variant prefix `Display` adds.
fn client_message(err: &AppError) -> String {
    match err {
        AppError::Unauthorized(msg)
        | AppError::NotFound(msg)
        | AppError::Validation(msg)
        | AppError::UploadNotVerified(msg)
        | AppError::Conflict(msg)
        | AppError::Unavailable(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_quota_body_carries_counts() {
        let (status, body) = render(AppError::QuotaExceeded {
            current: 2,
            requested: 2,
            max: 3,
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "quota_exceeded");
        assert_eq!(body["current"], 2);
        assert_eq!(body["requested"], 2);
        assert_eq!(body["max"], 3);
        assert_eq!(
            body["message"],
            "Too many files. Maximum allowed: 3. Current: 2, trying to upload: 2"
        );
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = render(AppError::Database("connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database_error");
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_not_found_message_is_bare() {
        let (status, body) = render(AppError::NotFound("Target not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Target not found");
    }

    #[tokio::test]
    async fn test_missing_object_has_its_own_code() {
        let (status, body) =
            render(AppError::UploadNotVerified("https://files.test/k is not in storage".into()))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "upload_not_verified");
        assert_eq!(body["message"], "https://files.test/k is not in storage");
    }
}
