use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::security::{self, TokenType};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::auth::{AccessTokenResponse, RefreshRequest, TokenPairResponse, VerifyRequest};
use crate::schemas::user::{LoginRequest, LoginUserResponse, RegisterRequest, UserResponse};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh))
        .route("/token/verify", post(verify))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username must be set".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let existing = repositories::users::exists_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("Username already taken".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let id = Uuid::new_v4().to_string();
    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &id,
            username,
            email: payload.email.as_deref(),
            hashed_password,
            role: payload.role,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(user_id = %user.id, "Registered user");

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let user = fetch_user_for_login(&state, &payload.username).await?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::BadRequest("Invalid credentials".to_string()))?;

    // Bad password and inactive account collapse into one message.
    if !verified || !user.is_active {
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    let access = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;
    let refresh = security::create_refresh_token(&user.id, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create refresh token"))?;

    Ok(Json(TokenPairResponse { access, refresh, user: LoginUserResponse::from_db(user) }))
}

async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let claims = security::verify_token(&payload.refresh, TokenType::Refresh, state.settings())
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token"))?;

    let user = repositories::users::find_by_id(state.db(), &claims.sub)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized("Invalid or expired refresh token"));
    };
    if !user.is_active {
        return Err(ApiError::Unauthorized("Invalid or expired refresh token"));
    }

    let access = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(AccessTokenResponse { access }))
}

async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    security::decode_token(&payload.token, state.settings())
        .map_err(|_| ApiError::Unauthorized("Token is invalid or expired"))?;

    Ok(Json(serde_json::json!({})))
}

async fn fetch_user_for_login(state: &AppState, username: &str) -> Result<User, ApiError> {
    repositories::users::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))
}

#[cfg(test)]
mod tests;
