//! Organization admin endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};

use crate::api::common::{ListQuery, PagedResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::api::uploads::FormData;
use crate::models::{CreateOrganizationInput, Organization, UpdateOrganizationInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_organizations).post(create_organization))
        .route("/{id}", get(get_organization))
        .route("/{id}", put(update_organization))
        .route("/{id}", delete(delete_organization))
}

async fn list_organizations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedResponse<Organization>>, ApiError> {
    let result = state
        .organization_service
        .list(query.params(), query.q.clone())
        .await?;
    Ok(Json(result.into()))
}

async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Organization>, ApiError> {
    Ok(Json(state.organization_service.get(id).await?))
}

async fn create_organization(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    let form = FormData::read(multipart).await?;

    let image = match form.file("image_file") {
        Some(file) => Some(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        ),
        None => None,
    };

    let input = CreateOrganizationInput {
        ar_name: form.text_or_empty("ar_name"),
        en_name: form.text_or_empty("en_name"),
        image: image.clone(),
        link: form.text_or_empty("link"),
    };

    // A rejected create must not leave the uploaded file behind
    let organization = match state.organization_service.create(input).await {
        Ok(organization) => organization,
        Err(e) => {
            state.asset_service.discard(image.as_deref()).await;
            return Err(e.into());
        }
    };
    Ok((StatusCode::CREATED, Json(organization)))
}

async fn update_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Organization>, ApiError> {
    let form = FormData::read(multipart).await?;
    let previous = state.organization_service.get(id).await?;

    let image = match form.file("image_file") {
        Some(file) => Some(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        ),
        None => None,
    };

    let input = UpdateOrganizationInput {
        ar_name: form.text("ar_name").map(str::to_string),
        en_name: form.text("en_name").map(str::to_string),
        image: image.clone(),
        link: form.text("link").map(str::to_string),
    };

    let organization = match state.organization_service.update(id, input).await {
        Ok(organization) => organization,
        Err(e) => {
            state.asset_service.discard(image.as_deref()).await;
            return Err(e.into());
        }
    };

    if image.is_some() {
        if let Some(old) = previous.image {
            let _ = state.asset_service.remove(&old).await;
        }
    }

    Ok(Json(organization))
}

async fn delete_organization(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.organization_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
