//! File access: redirects to a short-lived presigned GET.

use axum::{
    Router,
    extract::{Path, State},
    response::Redirect,
    routing::get,
};
use tracing::debug;

use crate::{ApiError, AppState, middleware::AuthUser};

/// Creates the file access routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/files/{*key}", get(open_file))
}

/// GET `/files/{*key}` - 307 to a presigned GET for one of the caller's
/// objects. Keys outside the caller's space are reported as not found.
async fn open_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> Result<Redirect, ApiError> {
    let presigned = state
        .upload_service()?
        .presign_download(auth.user_id(), &key)
        .await?;

    debug!(user_id = %auth.user_id(), %key, "Redirecting to presigned download");
    Ok(Redirect::temporary(&presigned.url))
}
