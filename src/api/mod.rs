//! API layer - HTTP handlers and routing
//!
//! Admin endpoints (writers, organizations, references, reports,
//! publications) sit behind authentication and the admin role; the
//! website endpoints are public, localized, and see published content
//! only. Uploaded assets are served from `/uploads/*`.

pub mod auth;
pub mod common;
pub mod middleware;
pub mod organizations;
pub mod publications;
pub mod references;
pub mod reports;
pub mod uploads;
pub mod website;
pub mod writers;

use std::path::Path;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the `/api` route tree
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need auth + admin role)
    let admin_routes = Router::new()
        .nest("/writers", writers::router())
        .nest("/organizations", organizations::router())
        .nest("/references", references::router())
        .nest("/reports", reports::router())
        .nest("/publications", publications::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/website", website::router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware and static serving
pub fn build_router(state: AppState, cors_origin: &str, upload_dir: &Path) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {cors_origin:?}, allowing none");
            CorsLayer::new()
        }
    };

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
