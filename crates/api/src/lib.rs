//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for auth, targets and the upload protocol
//! - Authentication middleware
//! - Error-to-response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use docket_core::storage::StorageService;
use docket_core::target::TargetService;
use docket_core::upload::UploadService;
use docket_db::TargetRepository;
use docket_shared::{AppError, JwtService};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Upload service wired to the Postgres repository and the configured store.
pub type AppUploadService = UploadService<TargetRepository, StorageService>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Object storage (optional; upload routes answer 503 without it).
    pub storage: Option<Arc<StorageService>>,
    /// Ceiling for server-mediated uploads, in bytes.
    pub max_server_upload_bytes: u64,
}

impl AppState {
    fn target_repository(&self) -> Arc<TargetRepository> {
        Arc::new(TargetRepository::new((*self.db).clone()))
    }

    /// Target CRUD service for this request.
    #[must_use]
    pub fn target_service(&self) -> TargetService<TargetRepository> {
        TargetService::new(self.target_repository())
    }

    /// Upload service for this request.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` when no object store is configured.
    pub fn upload_service(&self) -> Result<AppUploadService, ApiError> {
        let storage = self
            .storage
            .clone()
            .ok_or_else(|| AppError::Unavailable("File storage is not configured".to_string()))?;
        Ok(UploadService::new(
            storage,
            self.target_repository(),
            self.max_server_upload_bytes,
        ))
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
