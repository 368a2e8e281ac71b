//! Authentication endpoints

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{extract_access_token, ApiError, AppState, AuthenticatedUser};
use crate::models::{Session, User};

/// Routes that do not require an authenticated session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: String,
    pub refresh_expires_at: String,
}

impl From<Session> for TokenResponse {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            access_expires_at: session.access_expires_at.to_rfc3339(),
            refresh_expires_at: session.refresh_expires_at.to_rfc3339(),
        }
    }
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let session = state
        .user_service
        .login(&body.username, &body.password)
        .await?;
    Ok(Json(session.into()))
}

async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let session = state.user_service.refresh(&body.refresh_token).await?;
    Ok(Json(session.into()))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(token) = extract_access_token(&headers) {
        state.user_service.logout(&token).await?;
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<User> {
    Json(user.0)
}
