//! Reference admin endpoints (plain JSON, no file parts)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};

use crate::api::common::{ListQuery, PagedResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateReferenceInput, Reference, UpdateReferenceInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_references).post(create_reference))
        .route("/{id}", get(get_reference))
        .route("/{id}", put(update_reference))
        .route("/{id}", delete(delete_reference))
}

async fn list_references(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedResponse<Reference>>, ApiError> {
    let result = state
        .reference_service
        .list(query.params(), query.q.clone())
        .await?;
    Ok(Json(result.into()))
}

async fn get_reference(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Reference>, ApiError> {
    Ok(Json(state.reference_service.get(id).await?))
}

async fn create_reference(
    State(state): State<AppState>,
    Json(body): Json<CreateReferenceInput>,
) -> Result<(StatusCode, Json<Reference>), ApiError> {
    let reference = state.reference_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(reference)))
}

async fn update_reference(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateReferenceInput>,
) -> Result<Json<Reference>, ApiError> {
    Ok(Json(state.reference_service.update(id, body).await?))
}

async fn delete_reference(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.reference_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
