//! API middleware
//!
//! Authentication (access-token validation from bearer header or
//! cookie), admin authorization, shared application state, and the
//! error envelope every endpoint responds with.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{User, UserRole};
use crate::services::{
    AssetService, OrganizationService, OrganizationServiceError, PublicationService,
    PublicationServiceError, ReferenceService, ReferenceServiceError, ReportService,
    ReportServiceError, UserService, UserServiceError, WriterService, WriterServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub writer_service: Arc<WriterService>,
    pub organization_service: Arc<OrganizationService>,
    pub reference_service: Arc<ReferenceService>,
    pub report_service: Arc<ReportService>,
    pub publication_service: Arc<PublicationService>,
    pub asset_service: Arc<AssetService>,
}

/// Authenticated user extracted from request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

fn field_errors_details(errors: &[crate::services::FieldError]) -> serde_json::Value {
    serde_json::json!({ "fields": errors })
}

macro_rules! service_error_conversion {
    ($error:ident, $entity:literal) => {
        impl From<$error> for ApiError {
            fn from(e: $error) -> Self {
                match e {
                    $error::NotFound => ApiError::not_found(concat!($entity, " not found")),
                    $error::ValidationError(errors) => ApiError::with_details(
                        "VALIDATION_ERROR",
                        "Validation failed",
                        field_errors_details(&errors),
                    ),
                    $error::InternalError(e) => {
                        tracing::error!("{} operation failed: {:#}", $entity, e);
                        ApiError::internal_error("Internal server error")
                    }
                }
            }
        }
    };
}

service_error_conversion!(WriterServiceError, "Writer");
service_error_conversion!(OrganizationServiceError, "Organization");
service_error_conversion!(ReferenceServiceError, "Reference");
service_error_conversion!(ReportServiceError, "Report");
service_error_conversion!(PublicationServiceError, "Publication");

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError => {
                ApiError::unauthorized("Invalid username or password")
            }
            UserServiceError::InvalidToken => ApiError::unauthorized("Invalid or expired token"),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::Conflict(msg) => ApiError::conflict(msg),
            UserServiceError::InternalError(e) => {
                tracing::error!("Auth operation failed: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<crate::services::AssetServiceError> for ApiError {
    fn from(e: crate::services::AssetServiceError) -> Self {
        use crate::services::AssetServiceError;
        match e {
            AssetServiceError::UnsupportedType(t) => {
                ApiError::validation_error(format!("Unsupported file type: {t}"))
            }
            AssetServiceError::TooLarge { size, limit } => ApiError::validation_error(format!(
                "File too large: {size} bytes (limit {limit})"
            )),
            AssetServiceError::InternalError(e) => {
                tracing::error!("Asset operation failed: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract the access token from request headers.
///
/// Bearer header takes priority over the `accessToken` cookie.
pub fn extract_access_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("accessToken=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_access_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_access_token(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.0.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}
