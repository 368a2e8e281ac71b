//! Report management
//!
//! Reports are composite documents: the base row and both per-language
//! tables of contents are written together, so a failed write leaves
//! no partial report behind.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::Cache;
use crate::db::repositories::{ReportFilter, ReportRepository};
use crate::models::{CreateReportInput, ListParams, PagedResult, Report, UpdateReportInput};
use crate::services::validate::{FieldError, Validator};

#[derive(Debug, Error)]
pub enum ReportServiceError {
    #[error("Report not found")]
    NotFound,
    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

const CACHE_PREFIX: &str = "reports:";

pub struct ReportService {
    repo: Arc<dyn ReportRepository>,
    cache: Arc<Cache>,
}

impl ReportService {
    pub fn new(repo: Arc<dyn ReportRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(&self, input: CreateReportInput) -> Result<Report, ReportServiceError> {
        let mut v = Validator::new();
        v.require("ar_title", &input.ar_title);
        v.require("en_title", &input.en_title);
        v.require("ar_description", &input.ar_description);
        v.require("en_description", &input.en_description);
        v.require("ar_executive_summary", &input.ar_executive_summary);
        v.require("en_executive_summary", &input.en_executive_summary);
        validate_toc(&mut v, "ar_table_of_contents", &input.ar_table_of_contents);
        validate_toc(&mut v, "en_table_of_contents", &input.en_table_of_contents);
        v.finish().map_err(ReportServiceError::ValidationError)?;

        let report = self.repo.create(&input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(report)
    }

    pub async fn get(&self, id: i64) -> Result<Report, ReportServiceError> {
        let key = format!("{CACHE_PREFIX}id:{id}");
        if let Some(cached) = self.cache.get::<Report>(&key).await {
            return Ok(cached);
        }
        let report = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(ReportServiceError::NotFound)?;
        self.cache.set(&key, &report).await;
        Ok(report)
    }

    /// Fetch a report for public display. Drafts read as missing.
    pub async fn get_published(&self, id: i64) -> Result<Report, ReportServiceError> {
        let report = self.get(id).await?;
        if !report.publish {
            return Err(ReportServiceError::NotFound);
        }
        Ok(report)
    }

    pub async fn list(
        &self,
        params: ListParams,
        filter: ReportFilter,
    ) -> Result<PagedResult<Report>, ReportServiceError> {
        let key = format!(
            "{CACHE_PREFIX}list:{}:{}:{}:{:?}:{:?}",
            params.page,
            params.per_page,
            filter.q.as_deref().unwrap_or(""),
            filter.publish,
            filter.sort
        );
        if let Some(cached) = self.cache.get::<PagedResult<Report>>(&key).await {
            return Ok(cached);
        }

        let items = self
            .repo
            .list(params.offset(), params.limit(), &filter)
            .await?;
        let total = self.repo.count(&filter).await?;
        let result = PagedResult::new(items, total, &params);
        self.cache.set(&key, &result).await;
        Ok(result)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateReportInput,
    ) -> Result<Report, ReportServiceError> {
        let mut v = Validator::new();
        for (field, value) in [
            ("ar_title", &input.ar_title),
            ("en_title", &input.en_title),
            ("ar_description", &input.ar_description),
            ("en_description", &input.en_description),
            ("ar_executive_summary", &input.ar_executive_summary),
            ("en_executive_summary", &input.en_executive_summary),
        ] {
            if let Some(value) = value {
                v.require(field, value);
            }
        }
        if let Some(toc) = &input.ar_table_of_contents {
            validate_toc(&mut v, "ar_table_of_contents", toc);
        }
        if let Some(toc) = &input.en_table_of_contents {
            validate_toc(&mut v, "en_table_of_contents", toc);
        }
        v.finish().map_err(ReportServiceError::ValidationError)?;

        if !self.repo.exists(id).await? {
            return Err(ReportServiceError::NotFound);
        }

        let report = self.repo.update(id, &input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(report)
    }

    /// Toggle public visibility without touching any other field
    pub async fn set_publish(&self, id: i64, publish: bool) -> Result<Report, ReportServiceError> {
        let changed = self.repo.set_publish(id, publish).await?;
        if !changed {
            return Err(ReportServiceError::NotFound);
        }
        self.cache.delete_prefix(CACHE_PREFIX).await;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ReportServiceError> {
        let deleted = self.repo.delete(id).await?;
        if !deleted {
            return Err(ReportServiceError::NotFound);
        }
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(())
    }
}

fn validate_toc(v: &mut Validator, field: &str, entries: &[String]) {
    for (i, entry) in entries.iter().enumerate() {
        if entry.trim().is_empty() {
            v.push(field, format!("entry {i} must not be empty"));
        }
    }
}
