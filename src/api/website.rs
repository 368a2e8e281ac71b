//! Public website endpoints
//!
//! Read-only, no auth. Every route takes `lang=ar|en` (default `ar`)
//! and returns a localized projection carrying a `dir` field, so the
//! client renders one tree and flips direction off the response. Only
//! published content is visible; drafts read as 404.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::{PublicationFilter, ReportFilter};
use crate::models::{Lang, ListParams, Publication, PublicationKind, Report, SortOrder, Writer};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/publications", get(list_publications))
        .route("/publications/{id}", get(get_publication))
        .route("/reports", get(list_reports))
        .route("/reports/pub", get(published_report_titles))
        .route("/reports/{id}", get(get_report))
        .route("/writers/{id}", get(get_writer))
}

#[derive(Debug, Default, Deserialize)]
pub struct WebsiteQuery {
    pub lang: Option<Lang>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub kind: Option<PublicationKind>,
}

impl WebsiteQuery {
    fn lang(&self) -> Lang {
        self.lang.unwrap_or_default()
    }

    fn params(&self) -> ListParams {
        ListParams::new(self.page.unwrap_or(1), self.per_page.unwrap_or(12))
    }
}

/// Localized list envelope
#[derive(Debug, Serialize)]
pub struct LocalizedPage<T> {
    pub lang: Lang,
    pub dir: &'static str,
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
pub struct PublicationView {
    pub lang: Lang,
    pub dir: &'static str,
    pub id: i64,
    pub kind: PublicationKind,
    pub title: String,
    pub description: String,
    pub note: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub tags: Vec<String>,
    pub time_to_read: Option<i64>,
    pub date_of_publish: String,
    pub writer_ids: Vec<i64>,
    pub reference_ids: Vec<i64>,
    pub report_id: Option<i64>,
}

impl PublicationView {
    fn project(publication: Publication, lang: Lang) -> Self {
        let (title, description, note) = match lang {
            Lang::Ar => (
                publication.ar_title,
                publication.ar_description,
                publication.ar_note,
            ),
            Lang::En => (
                publication.en_title,
                publication.en_description,
                publication.en_note,
            ),
        };
        Self {
            lang,
            dir: lang.dir(),
            id: publication.id,
            kind: publication.kind,
            title,
            description,
            note,
            image: publication.image,
            gallery: publication.gallery,
            tags: publication.tags,
            time_to_read: publication.time_to_read,
            date_of_publish: publication.date_of_publish.to_string(),
            writer_ids: publication.writer_ids,
            reference_ids: publication.reference_ids,
            report_id: publication.report_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportView {
    pub lang: Lang,
    pub dir: &'static str,
    pub id: i64,
    pub title: String,
    pub description: String,
    pub executive_summary: String,
    pub note: String,
    pub table_of_contents: Vec<String>,
    pub image: Option<String>,
    pub pdf_file: Option<String>,
    pub pdf_image: Option<String>,
    pub date_of_report: String,
    pub date_of_publish: String,
}

impl ReportView {
    fn project(report: Report, lang: Lang) -> Self {
        let (title, description, executive_summary, note, table_of_contents) = match lang {
            Lang::Ar => (
                report.ar_title,
                report.ar_description,
                report.ar_executive_summary,
                report.ar_note,
                report.ar_table_of_contents,
            ),
            Lang::En => (
                report.en_title,
                report.en_description,
                report.en_executive_summary,
                report.en_note,
                report.en_table_of_contents,
            ),
        };
        Self {
            lang,
            dir: lang.dir(),
            id: report.id,
            title,
            description,
            executive_summary,
            note,
            table_of_contents,
            image: report.image,
            pdf_file: report.pdf_file,
            pdf_image: report.pdf_image,
            date_of_report: report.date_of_report.to_string(),
            date_of_publish: report.date_of_publish.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WriterView {
    pub lang: Lang,
    pub dir: &'static str,
    pub id: i64,
    pub full_name: String,
    pub description: String,
    pub role: String,
    pub image: Option<String>,
    pub social_links: Vec<crate::models::SocialLink>,
}

impl WriterView {
    fn project(writer: Writer, lang: Lang) -> Self {
        let (full_name, description, role) = match lang {
            Lang::Ar => (writer.ar_full_name, writer.ar_description, writer.ar_role),
            Lang::En => (writer.en_full_name, writer.en_description, writer.en_role),
        };
        Self {
            lang,
            dir: lang.dir(),
            id: writer.id,
            full_name,
            description,
            role,
            image: writer.image,
            social_links: writer.social_links,
        }
    }
}

/// Report id + localized title, for pickers
#[derive(Debug, Serialize)]
pub struct ReportTitle {
    pub id: i64,
    pub title: String,
}

async fn list_publications(
    State(state): State<AppState>,
    Query(query): Query<WebsiteQuery>,
) -> Result<Json<LocalizedPage<PublicationView>>, ApiError> {
    let lang = query.lang();
    let filter = PublicationFilter {
        q: None,
        publish: Some(true),
        kind: query.kind,
        sort: SortOrder::Newest,
    };
    let result = state
        .publication_service
        .list(query.params(), filter)
        .await?;
    let total_pages = result.total_pages();

    Ok(Json(LocalizedPage {
        lang,
        dir: lang.dir(),
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages,
        items: result
            .items
            .into_iter()
            .map(|p| PublicationView::project(p, lang))
            .collect(),
    }))
}

async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<WebsiteQuery>,
) -> Result<Json<PublicationView>, ApiError> {
    let publication = state.publication_service.get_published(id).await?;
    Ok(Json(PublicationView::project(publication, query.lang())))
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<WebsiteQuery>,
) -> Result<Json<LocalizedPage<ReportView>>, ApiError> {
    let lang = query.lang();
    let filter = ReportFilter {
        q: None,
        publish: Some(true),
        sort: SortOrder::Newest,
    };
    let result = state.report_service.list(query.params(), filter).await?;
    let total_pages = result.total_pages();

    Ok(Json(LocalizedPage {
        lang,
        dir: lang.dir(),
        total: result.total,
        page: result.page,
        per_page: result.per_page,
        total_pages,
        items: result
            .items
            .into_iter()
            .map(|r| ReportView::project(r, lang))
            .collect(),
    }))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<WebsiteQuery>,
) -> Result<Json<ReportView>, ApiError> {
    let report = state.report_service.get_published(id).await?;
    Ok(Json(ReportView::project(report, query.lang())))
}

/// Published report titles only, id + localized title
async fn published_report_titles(
    State(state): State<AppState>,
    Query(query): Query<WebsiteQuery>,
) -> Result<Json<Vec<ReportTitle>>, ApiError> {
    let lang = query.lang();
    let filter = ReportFilter {
        q: None,
        publish: Some(true),
        sort: SortOrder::Newest,
    };
    let result = state
        .report_service
        .list(ListParams::new(1, 100), filter)
        .await?;

    Ok(Json(
        result
            .items
            .into_iter()
            .map(|r| ReportTitle {
                id: r.id,
                title: match lang {
                    Lang::Ar => r.ar_title,
                    Lang::En => r.en_title,
                },
            })
            .collect(),
    ))
}

async fn get_writer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<WebsiteQuery>,
) -> Result<Json<WriterView>, ApiError> {
    let writer = state.writer_service.get(id).await?;
    Ok(Json(WriterView::project(writer, query.lang())))
}
