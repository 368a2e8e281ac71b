//! Publication admin endpoints

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, put},
    Json, Router,
};
use serde::{Deserialize, Deserializer};

use crate::api::common::{ListQuery, PagedResponse};
use crate::api::middleware::{ApiError, AppState};
use crate::api::uploads::FormData;
use crate::db::repositories::PublicationFilter;
use crate::models::{
    one_or_many_opt, CreatePublicationInput, Publication, PublicationKind,
    PublicationRelationsInput, UpdatePublicationInput,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_publications).post(create_publication))
        .route("/{id}", get(get_publication))
        .route("/{id}", put(update_publication))
        .route("/{id}", patch(replace_relations))
        .route("/{id}", delete(delete_publication))
        .route("/{id}/publish", patch(set_publish))
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub publish: bool,
}

/// Replace-all relations payload.
///
/// Relation-list fields accept a bare scalar as a one-element list.
/// `report_id: null` detaches the report; an absent `report_id`
/// leaves it unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct RelationsRequest {
    #[serde(default, deserialize_with = "one_or_many_opt")]
    pub tags: Option<Vec<String>>,
    pub time_to_read: Option<i64>,
    #[serde(default, deserialize_with = "one_or_many_opt")]
    pub writer_ids: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "one_or_many_opt")]
    pub reference_ids: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub report_id: Option<Option<i64>>,
}

/// Distinguishes an absent `report_id` from an explicit `null`
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

async fn list_publications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedResponse<Publication>>, ApiError> {
    let filter = PublicationFilter {
        q: query.q.clone(),
        publish: query.publish,
        kind: parse_kind(query.kind.as_deref())?,
        sort: query.sort(),
    };
    let result = state
        .publication_service
        .list(query.params(), filter)
        .await?;
    Ok(Json(result.into()))
}

async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Publication>, ApiError> {
    Ok(Json(state.publication_service.get(id).await?))
}

async fn create_publication(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Publication>), ApiError> {
    let form = FormData::read(multipart).await?;

    let kind = match form.text("kind") {
        Some(raw) => parse_kind(Some(raw))?.unwrap_or_default(),
        None => PublicationKind::default(),
    };
    let time_to_read = form.integer("time_to_read")?;
    let date_of_publish = form.require_date("date_of_publish")?;
    let writer_ids = form.id_list("writer_ids")?.unwrap_or_default();
    let reference_ids = form.id_list("reference_ids")?.unwrap_or_default();
    let report_id = form.integer("report_id")?;

    let image = store_image(&state, &form, "image_file").await?;
    let gallery = store_gallery(&state, &form).await?;

    let input = CreatePublicationInput {
        kind,
        ar_title: form.text_or_empty("ar_title"),
        en_title: form.text_or_empty("en_title"),
        ar_description: form.text_or_empty("ar_description"),
        en_description: form.text_or_empty("en_description"),
        ar_note: form.text_or_empty("ar_note"),
        en_note: form.text_or_empty("en_note"),
        image: image.clone(),
        gallery: gallery.clone(),
        tags: form.all("tags").unwrap_or_default(),
        time_to_read,
        date_of_publish,
        writer_ids,
        reference_ids,
        report_id,
    };

    // A rejected create must not leave the uploaded files behind
    let publication = match state.publication_service.create(input).await {
        Ok(publication) => publication,
        Err(e) => {
            state
                .asset_service
                .discard(
                    image
                        .as_deref()
                        .into_iter()
                        .chain(gallery.iter().map(String::as_str))
                        .collect::<Vec<_>>(),
                )
                .await;
            return Err(e.into());
        }
    };
    Ok((StatusCode::CREATED, Json(publication)))
}

async fn update_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Publication>, ApiError> {
    let form = FormData::read(multipart).await?;
    let previous = state.publication_service.get(id).await?;

    let kind = match form.text("kind") {
        Some(raw) => parse_kind(Some(raw))?,
        None => None,
    };
    let date_of_publish = form.date("date_of_publish")?;
    let image = store_image(&state, &form, "image_file").await?;
    let gallery = if form.file_list("gallery").is_empty() {
        None
    } else {
        Some(store_gallery(&state, &form).await?)
    };

    let input = UpdatePublicationInput {
        kind,
        ar_title: form.text("ar_title").map(str::to_string),
        en_title: form.text("en_title").map(str::to_string),
        ar_description: form.text("ar_description").map(str::to_string),
        en_description: form.text("en_description").map(str::to_string),
        ar_note: form.text("ar_note").map(str::to_string),
        en_note: form.text("en_note").map(str::to_string),
        image: image.clone(),
        gallery: gallery.clone(),
        date_of_publish,
    };

    let publication = match state.publication_service.update(id, input).await {
        Ok(publication) => publication,
        Err(e) => {
            state
                .asset_service
                .discard(
                    image
                        .as_deref()
                        .into_iter()
                        .chain(gallery.iter().flatten().map(String::as_str))
                        .collect::<Vec<_>>(),
                )
                .await;
            return Err(e.into());
        }
    };

    if image.is_some() {
        if let Some(old) = previous.image {
            let _ = state.asset_service.remove(&old).await;
        }
    }
    if gallery.is_some() {
        for old in previous.gallery {
            let _ = state.asset_service.remove(&old).await;
        }
    }

    Ok(Json(publication))
}

async fn replace_relations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<RelationsRequest>,
) -> Result<Json<Publication>, ApiError> {
    let input = PublicationRelationsInput {
        tags: body.tags,
        time_to_read: body.time_to_read,
        writer_ids: body.writer_ids,
        reference_ids: body.reference_ids,
        report_id: body.report_id,
    };
    Ok(Json(
        state.publication_service.replace_relations(id, input).await?,
    ))
}

async fn set_publish(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<Publication>, ApiError> {
    Ok(Json(
        state
            .publication_service
            .set_publish(id, body.publish)
            .await?,
    ))
}

async fn delete_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.publication_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}


fn parse_kind(raw: Option<&str>) -> Result<Option<PublicationKind>, ApiError> {
    match raw {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => PublicationKind::from_str(raw)
            .map(Some)
            .ok_or_else(|| ApiError::validation_error(format!("Unknown publication kind: {raw}"))),
    }
}

async fn store_image(
    state: &AppState,
    form: &FormData,
    field: &str,
) -> Result<Option<String>, ApiError> {
    match form.file(field) {
        Some(file) => Ok(Some(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        )),
        None => Ok(None),
    }
}

async fn store_gallery(state: &AppState, form: &FormData) -> Result<Vec<String>, ApiError> {
    let mut urls = Vec::new();
    for file in form.file_list("gallery") {
        urls.push(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        );
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relations_request_scalar_becomes_list() {
        let body: RelationsRequest =
            serde_json::from_str(r#"{"writer_ids": 3, "tags": "economy"}"#).unwrap();
        assert_eq!(body.writer_ids, Some(vec![3]));
        assert_eq!(body.tags, Some(vec!["economy".to_string()]));
        assert_eq!(body.report_id, None);
    }

    #[test]
    fn test_relations_request_null_report_detaches() {
        let body: RelationsRequest = serde_json::from_str(r#"{"report_id": null}"#).unwrap();
        assert_eq!(body.report_id, Some(None));

        let body: RelationsRequest = serde_json::from_str(r#"{"report_id": 5}"#).unwrap();
        assert_eq!(body.report_id, Some(Some(5)));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(
            parse_kind(Some("analysis")).unwrap(),
            Some(PublicationKind::Analysis)
        );
        assert_eq!(parse_kind(Some("")).unwrap(), None);
        assert!(parse_kind(Some("gallery")).is_err());
    }
}
