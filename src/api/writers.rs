//! Writer admin endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{ListQuery, PagedResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::api::uploads::FormData;
use crate::models::{
    one_or_many_opt, CreateWriterInput, SocialLink, UpdateWriterInput, Writer,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_writers).post(create_writer))
        .route("/{id}", get(get_writer))
        .route("/{id}", put(update_writer))
        .route("/{id}", patch(replace_social_links))
        .route("/{id}", delete(delete_writer))
}

async fn list_writers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedResponse<Writer>>, ApiError> {
    let result = state
        .writer_service
        .list(query.params(), query.q.clone())
        .await?;
    Ok(Json(result.into()))
}

async fn get_writer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Writer>, ApiError> {
    Ok(Json(state.writer_service.get(id).await?))
}

async fn create_writer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Writer>), ApiError> {
    let form = FormData::read(multipart).await?;
    let social_links = parse_social_links(&form)?;

    let image = match form.file("image_file") {
        Some(file) => Some(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        ),
        None => None,
    };

    let input = CreateWriterInput {
        ar_full_name: form.text_or_empty("ar_full_name"),
        en_full_name: form.text_or_empty("en_full_name"),
        ar_description: form.text_or_empty("ar_description"),
        en_description: form.text_or_empty("en_description"),
        ar_role: form.text_or_empty("ar_role"),
        en_role: form.text_or_empty("en_role"),
        image: image.clone(),
        social_links: social_links.unwrap_or_default(),
    };

    // A rejected create must not leave the uploaded file behind
    let writer = match state.writer_service.create(input).await {
        Ok(writer) => writer,
        Err(e) => {
            state.asset_service.discard(image.as_deref()).await;
            return Err(e.into());
        }
    };
    Ok((StatusCode::CREATED, Json(writer)))
}

async fn update_writer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Writer>, ApiError> {
    let form = FormData::read(multipart).await?;
    let social_links = parse_social_links(&form)?;
    let previous = state.writer_service.get(id).await?;

    let image = match form.file("image_file") {
        Some(file) => Some(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        ),
        None => None,
    };

    let input = UpdateWriterInput {
        ar_full_name: form.text("ar_full_name").map(str::to_string),
        en_full_name: form.text("en_full_name").map(str::to_string),
        ar_description: form.text("ar_description").map(str::to_string),
        en_description: form.text("en_description").map(str::to_string),
        ar_role: form.text("ar_role").map(str::to_string),
        en_role: form.text("en_role").map(str::to_string),
        image: image.clone(),
    };

    let writer = match state.writer_service.update(id, input, social_links).await {
        Ok(writer) => writer,
        Err(e) => {
            state.asset_service.discard(image.as_deref()).await;
            return Err(e.into());
        }
    };

    if image.is_some() {
        if let Some(old) = previous.image {
            // Best effort; the new image is already in place
            let _ = state.asset_service.remove(&old).await;
        }
    }

    Ok(Json(writer))
}

/// Replace-all social-link list
#[derive(Debug, Deserialize)]
pub struct SocialLinksRequest {
    #[serde(default, deserialize_with = "one_or_many_opt")]
    pub social_links: Option<Vec<SocialLink>>,
}

async fn replace_social_links(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SocialLinksRequest>,
) -> Result<Json<Writer>, ApiError> {
    let writer = state
        .writer_service
        .update(id, UpdateWriterInput::default(), body.social_links)
        .await?;
    Ok(Json(writer))
}

async fn delete_writer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.writer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Social links arrive as a JSON array in a text part
fn parse_social_links(form: &FormData) -> Result<Option<Vec<SocialLink>>, ApiError> {
    match form.text("social_links") {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(Some(Vec::new())),
        Some(raw) => serde_json::from_str(raw)
            .map(Some)
            .map_err(|_| ApiError::validation_error("social_links must be a JSON array")),
    }
}
