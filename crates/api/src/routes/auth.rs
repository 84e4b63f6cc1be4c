//! Authentication routes for login, register, and logout.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use tracing::info;

use crate::{ApiError, AppState};
use docket_core::auth::{
    hash_password, normalize_username, validate_registration, verify_against_dummy,
    verify_password,
};
use docket_db::{CreateUserInput, UserRepository, repositories::to_view};
use docket_shared::AppError;
use docket_shared::auth::{LoginRequest, LoginResponse, RegisterRequest, UserView};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
}

fn invalid_credentials() -> ApiError {
    AppError::Unauthorized("Invalid username or password".to_string()).into()
}

/// POST /auth/login - Authenticate user and return a token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = normalize_username(&payload.username);
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("username and password are required".to_string()).into());
    }

    let user_repo = UserRepository::new((*state.db).clone());
    let Some(user) = user_repo.find_by_username(&username).await? else {
        verify_against_dummy(&payload.password);
        info!(%username, "Login attempt for non-existent user");
        return Err(invalid_credentials());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("This account has been disabled".to_string()).into());
    }

    let token = state
        .jwt_service
        .generate_access_token(user.id, &user.username)?;

    info!(user_id = %user.id, "User logged in successfully");

    Ok(Json(LoginResponse {
        user: to_view(&user),
        token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// POST /auth/register - Register a new user.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    validate_registration(
        &payload.username,
        &payload.password,
        &payload.name,
        &payload.phone,
    )
    .map_err(AppError::Validation)?;

    let username = normalize_username(&payload.username);
    let user_repo = UserRepository::new((*state.db).clone());
    if user_repo.username_exists(&username).await? {
        return Err(AppError::Conflict("Username already exists".to_string()).into());
    }

    let password_hash = hash_password(&payload.password)?;
    let user = user_repo
        .create(CreateUserInput {
            username,
            password_hash,
            name: payload.name.trim().to_string(),
            phone: payload.phone.trim().to_string(),
        })
        .await
        .map_err(|e| match e.sql_err() {
            // Lost a race with a concurrent registration.
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::from(AppError::Conflict("Username already exists".to_string()))
            }
            _ => ApiError::from(e),
        })?;

    info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(to_view(&user))))
}

/// POST /auth/logout - Tokens are stateless; the client discards its copy.
async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logged out" }))
}
