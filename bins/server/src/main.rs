//! Docket API Server
//!
//! Main entry point for the Docket backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docket_api::{AppState, create_router};
use docket_core::storage::{StorageConfig, StorageService};
use docket_db::connect_with_pool;
use docket_shared::config::StorageSettings;
use docket_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docket=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await
    .context("Failed to connect to database")?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_secs: i64::try_from(config.jwt.access_token_expiry_secs)
            .context("jwt.access_token_expiry_secs is too large")?,
    });

    let storage = open_storage(&config.storage);

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage,
        max_server_upload_bytes: config.upload.max_server_upload_bytes,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Upload routes answer 503 when the store cannot be opened; the rest of the
/// API keeps working.
fn open_storage(settings: &StorageSettings) -> Option<Arc<StorageService>> {
    match StorageService::from_config(StorageConfig::from_settings(settings)) {
        Ok(service) => {
            info!(
                provider = service.provider_name(),
                public_base_url = %service.config().public_base_url,
                verify_uploads = service.config().verify_uploads,
                "Object storage configured"
            );
            Some(Arc::new(service))
        }
        Err(e) => {
            warn!(error = %e, "Object storage unavailable; upload routes disabled");
            None
        }
    }
}
