//! Report admin endpoints

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
use crate::db::repositories::ReportFilter;
use crate::models::{CreateReportInput, Report, UpdateReportInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(create_report))
        .route("/{id}", get(get_report))
        .route("/{id}", put(update_report))
        .route("/{id}", delete(delete_report))
        .route("/{id}/publish", patch(set_publish))
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub publish: bool,
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PagedResponse<Report>>, ApiError> {
    let filter = ReportFilter {
        q: query.q.clone(),
        publish: query.publish,
        sort: query.sort(),
    };
    let result = state.report_service.list(query.params(), filter).await?;
    Ok(Json(result.into()))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(state.report_service.get(id).await?))
}

async fn create_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let form = FormData::read(multipart).await?;
    let date_of_report = form.require_date("date_of_report")?;
    let date_of_publish = form.require_date("date_of_publish")?;
    let assets = store_report_assets(&state, &form).await?;

    let input = CreateReportInput {
        ar_title: form.text_or_empty("ar_title"),
        en_title: form.text_or_empty("en_title"),
        ar_description: form.text_or_empty("ar_description"),
        en_description: form.text_or_empty("en_description"),
        ar_executive_summary: form.text_or_empty("ar_executive_summary"),
        en_executive_summary: form.text_or_empty("en_executive_summary"),
        ar_note: form.text_or_empty("ar_note"),
        en_note: form.text_or_empty("en_note"),
        ar_table_of_contents: form.all("ar_toc").unwrap_or_default(),
        en_table_of_contents: form.all("en_toc").unwrap_or_default(),
        image: assets.image.clone(),
        pdf_file: assets.pdf.clone(),
        pdf_image: assets.pdf_image.clone(),
        date_of_report,
        date_of_publish,
    };

    // A rejected create must not leave the uploaded files behind
    let report = match state.report_service.create(input).await {
        Ok(report) => report,
        Err(e) => {
            state.asset_service.discard(assets.urls()).await;
            return Err(e.into());
        }
    };
    Ok((StatusCode::CREATED, Json(report)))
}

async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Report>, ApiError> {
    let form = FormData::read(multipart).await?;
    let date_of_report = form.date("date_of_report")?;
    let date_of_publish = form.date("date_of_publish")?;
    let previous = state.report_service.get(id).await?;
    let assets = store_report_assets(&state, &form).await?;

    let input = UpdateReportInput {
        ar_title: form.text("ar_title").map(str::to_string),
        en_title: form.text("en_title").map(str::to_string),
        ar_description: form.text("ar_description").map(str::to_string),
        en_description: form.text("en_description").map(str::to_string),
        ar_executive_summary: form.text("ar_executive_summary").map(str::to_string),
        en_executive_summary: form.text("en_executive_summary").map(str::to_string),
        ar_note: form.text("ar_note").map(str::to_string),
        en_note: form.text("en_note").map(str::to_string),
        ar_table_of_contents: form.all("ar_toc"),
        en_table_of_contents: form.all("en_toc"),
        image: assets.image.clone(),
        pdf_file: assets.pdf.clone(),
        pdf_image: assets.pdf_image.clone(),
        date_of_report,
        date_of_publish,
    };

    let report = match state.report_service.update(id, input).await {
        Ok(report) => report,
        Err(e) => {
            state.asset_service.discard(assets.urls()).await;
            return Err(e.into());
        }
    };

    // Replaced files: drop the superseded assets, best effort
    for (new, old) in [
        (&assets.image, previous.image),
        (&assets.pdf, previous.pdf_file),
        (&assets.pdf_image, previous.pdf_image),
    ] {
        if new.is_some() {
            if let Some(old) = old {
                let _ = state.asset_service.remove(&old).await;
            }
        }
    }

    Ok(Json(report))
}

async fn set_publish(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(state.report_service.set_publish(id, body.publish).await?))
}

async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.report_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

struct ReportAssets {
    image: Option<String>,
    pdf: Option<String>,
    pdf_image: Option<String>,
}

impl ReportAssets {
    fn urls(&self) -> impl Iterator<Item = &str> {
        [&self.image, &self.pdf, &self.pdf_image]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}

async fn store_report_assets(
    state: &AppState,
    form: &FormData,
) -> Result<ReportAssets, ApiError> {
    let image = match form.file("image_file") {
        Some(file) => Some(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        ),
        None => None,
    };
    let pdf = match form.file("pdf_file") {
        Some(file) => Some(
            state
                .asset_service
                .store_pdf(&file.content_type, &file.data)
                .await?,
        ),
        None => None,
    };
    let pdf_image = match form.file("pdf_image_file") {
        Some(file) => Some(
            state
                .asset_service
                .store_image(&file.content_type, &file.data)
                .await?,
        ),
        None => None,
    };
    Ok(ReportAssets {
        image,
        pdf,
        pdf_image,
    })
}
