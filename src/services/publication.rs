//! Publication management
//!
//! The central content workflow. Composite payloads (base fields plus
//! gallery, tags, writer/reference links, and the optional report
//! link) are validated up front, including existence of every related
//! id, and then written in a single transaction by the repository.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::Cache;
use crate::db::repositories::{
    PublicationFilter, PublicationRepository, ReferenceRepository, ReportRepository,
    WriterRepository,
};
use crate::models::{
    CreatePublicationInput, ListParams, PagedResult, Publication, PublicationRelationsInput,
    UpdatePublicationInput,
};
use crate::services::validate::{FieldError, Validator};

/// Inclusive bounds for the time-to-read estimate, in minutes
const TIME_TO_READ_MIN: i64 = 1;
const TIME_TO_READ_MAX: i64 = 240;

#[derive(Debug, Error)]
pub enum PublicationServiceError {
    #[error("Publication not found")]
    NotFound,
    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

const CACHE_PREFIX: &str = "publications:";

pub struct PublicationService {
    repo: Arc<dyn PublicationRepository>,
    writers: Arc<dyn WriterRepository>,
    references: Arc<dyn ReferenceRepository>,
    reports: Arc<dyn ReportRepository>,
    cache: Arc<Cache>,
}

impl PublicationService {
    pub fn new(
        repo: Arc<dyn PublicationRepository>,
        writers: Arc<dyn WriterRepository>,
        references: Arc<dyn ReferenceRepository>,
        reports: Arc<dyn ReportRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            repo,
            writers,
            references,
            reports,
            cache,
        }
    }

    pub async fn create(
        &self,
        input: CreatePublicationInput,
    ) -> Result<Publication, PublicationServiceError> {
        let mut v = Validator::new();
        v.require("ar_title", &input.ar_title);
        v.require("en_title", &input.en_title);
        v.require("ar_description", &input.ar_description);
        v.require("en_description", &input.en_description);
        if let Some(minutes) = input.time_to_read {
            v.range("time_to_read", minutes, TIME_TO_READ_MIN, TIME_TO_READ_MAX);
        }
        validate_tags(&mut v, &input.tags);
        self.check_relations(
            &mut v,
            Some(&input.writer_ids),
            Some(&input.reference_ids),
            input.report_id,
        )
        .await?;
        v.finish()
            .map_err(PublicationServiceError::ValidationError)?;

        let publication = self.repo.create(&input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(publication)
    }

    pub async fn get(&self, id: i64) -> Result<Publication, PublicationServiceError> {
        let key = format!("{CACHE_PREFIX}id:{id}");
        if let Some(cached) = self.cache.get::<Publication>(&key).await {
            return Ok(cached);
        }
        let publication = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(PublicationServiceError::NotFound)?;
        self.cache.set(&key, &publication).await;
        Ok(publication)
    }

    /// Fetch a publication for public display. Drafts read as missing.
    pub async fn get_published(&self, id: i64) -> Result<Publication, PublicationServiceError> {
        let publication = self.get(id).await?;
        if !publication.publish {
            return Err(PublicationServiceError::NotFound);
        }
        Ok(publication)
    }

    pub async fn list(
        &self,
        params: ListParams,
        filter: PublicationFilter,
    ) -> Result<PagedResult<Publication>, PublicationServiceError> {
        let key = format!(
            "{CACHE_PREFIX}list:{}:{}:{}:{:?}:{:?}:{:?}",
            params.page,
            params.per_page,
            filter.q.as_deref().unwrap_or(""),
            filter.publish,
            filter.kind,
            filter.sort
        );
        if let Some(cached) = self.cache.get::<PagedResult<Publication>>(&key).await {
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
        input: UpdatePublicationInput,
    ) -> Result<Publication, PublicationServiceError> {
        let mut v = Validator::new();
        for (field, value) in [
            ("ar_title", &input.ar_title),
            ("en_title", &input.en_title),
            ("ar_description", &input.ar_description),
            ("en_description", &input.en_description),
        ] {
            if let Some(value) = value {
                v.require(field, value);
            }
        }
        v.finish()
            .map_err(PublicationServiceError::ValidationError)?;

        if self.repo.get_by_id(id).await?.is_none() {
            return Err(PublicationServiceError::NotFound);
        }

        let publication = self.repo.update(id, &input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(publication)
    }

    /// Replace relational data with exactly the submitted sets.
    ///
    /// Fields left unset keep their stored value; a provided list
    /// replaces the stored one wholesale.
    pub async fn replace_relations(
        &self,
        id: i64,
        input: PublicationRelationsInput,
    ) -> Result<Publication, PublicationServiceError> {
        let mut v = Validator::new();
        if let Some(minutes) = input.time_to_read {
            v.range("time_to_read", minutes, TIME_TO_READ_MIN, TIME_TO_READ_MAX);
        }
        if let Some(tags) = &input.tags {
            validate_tags(&mut v, tags);
        }
        self.check_relations(
            &mut v,
            input.writer_ids.as_deref(),
            input.reference_ids.as_deref(),
            input.report_id.flatten(),
        )
        .await?;
        v.finish()
            .map_err(PublicationServiceError::ValidationError)?;

        if self.repo.get_by_id(id).await?.is_none() {
            return Err(PublicationServiceError::NotFound);
        }

        let publication = self.repo.replace_relations(id, &input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(publication)
    }

    /// Toggle public visibility without touching any other field
    pub async fn set_publish(
        &self,
        id: i64,
        publish: bool,
    ) -> Result<Publication, PublicationServiceError> {
        let changed = self.repo.set_publish(id, publish).await?;
        if !changed {
            return Err(PublicationServiceError::NotFound);
        }
        self.cache.delete_prefix(CACHE_PREFIX).await;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), PublicationServiceError> {
        let deleted = self.repo.delete(id).await?;
        if !deleted {
            return Err(PublicationServiceError::NotFound);
        }
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(())
    }

    /// Verify that every referenced id exists before any write starts
    async fn check_relations(
        &self,
        v: &mut Validator,
        writer_ids: Option<&[i64]>,
        reference_ids: Option<&[i64]>,
        report_id: Option<i64>,
    ) -> Result<(), PublicationServiceError> {
        if let Some(ids) = writer_ids {
            if !self.writers.all_exist(ids).await? {
                v.push("writer_ids", "contains an unknown writer id");
            }
        }
        if let Some(ids) = reference_ids {
            if !self.references.all_exist(ids).await? {
                v.push("reference_ids", "contains an unknown reference id");
            }
        }
        if let Some(report_id) = report_id {
            if !self.reports.exists(report_id).await? {
                v.push("report_id", "refers to an unknown report");
            }
        }
        Ok(())
    }
}

fn validate_tags(v: &mut Validator, tags: &[String]) {
    for (i, tag) in tags.iter().enumerate() {
        if tag.trim().is_empty() {
            v.push("tags", format!("entry {i} must not be empty"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::migrations::run_migrations;
    use crate::db::repositories::{
        SqlxPublicationRepository, SqlxReferenceRepository, SqlxReportRepository,
        SqlxWriterRepository,
    };
    use crate::db::create_test_pool;
    use crate::models::{CreateWriterInput, PublicationKind};
    use chrono::NaiveDate;

    struct Ctx {
        service: PublicationService,
        writers: Arc<dyn WriterRepository>,
    }

    async fn setup() -> Ctx {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let writers = SqlxWriterRepository::boxed(pool.clone());
        let service = PublicationService::new(
            SqlxPublicationRepository::boxed(pool.clone()),
            writers.clone(),
            SqlxReferenceRepository::boxed(pool.clone()),
            SqlxReportRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        );
        Ctx { service, writers }
    }

    fn sample_input() -> CreatePublicationInput {
        CreatePublicationInput {
            kind: PublicationKind::Post,
            ar_title: "مقال جديد".to_string(),
            en_title: "New Article".to_string(),
            ar_description: "نص المقال".to_string(),
            en_description: "Article body".to_string(),
            ar_note: String::new(),
            en_note: String::new(),
            image: None,
            gallery: Vec::new(),
            tags: vec!["policy".to_string()],
            time_to_read: Some(7),
            date_of_publish: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            writer_ids: Vec::new(),
            reference_ids: Vec::new(),
            report_id: None,
        }
    }

    async fn create_writer(writers: &Arc<dyn WriterRepository>) -> i64 {
        writers
            .create(&CreateWriterInput {
                ar_full_name: "كاتب".to_string(),
                en_full_name: "Writer".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_writer_id() {
        let ctx = setup().await;
        let mut input = sample_input();
        input.writer_ids = vec![999];

        let err = ctx.service.create(input).await.unwrap_err();
        match err {
            PublicationServiceError::ValidationError(errors) => {
                assert_eq!(errors[0].field, "writer_ids");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_range_time_to_read() {
        let ctx = setup().await;
        let mut input = sample_input();
        input.time_to_read = Some(0);

        assert!(matches!(
            ctx.service.create(input).await,
            Err(PublicationServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_relations_replace_all() {
        let ctx = setup().await;
        let first = create_writer(&ctx.writers).await;
        let second = create_writer(&ctx.writers).await;

        let mut input = sample_input();
        input.writer_ids = vec![first];
        let publication = ctx.service.create(input).await.unwrap();
        assert_eq!(publication.writer_ids, vec![first]);

        let updated = ctx
            .service
            .replace_relations(
                publication.id,
                PublicationRelationsInput {
                    writer_ids: Some(vec![second]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.writer_ids, vec![second]);
        // Unset fields keep their stored values
        assert_eq!(updated.tags, vec!["policy".to_string()]);
        assert_eq!(updated.time_to_read, Some(7));
    }

    #[tokio::test]
    async fn test_detach_report_with_explicit_null() {
        let ctx = setup().await;
        let publication = ctx.service.create(sample_input()).await.unwrap();

        let updated = ctx
            .service
            .replace_relations(
                publication.id,
                PublicationRelationsInput {
                    report_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.report_id, None);
    }

    #[tokio::test]
    async fn test_draft_is_hidden_from_public_reads() {
        let ctx = setup().await;
        let publication = ctx.service.create(sample_input()).await.unwrap();
        assert!(!publication.publish);

        assert!(matches!(
            ctx.service.get_published(publication.id).await,
            Err(PublicationServiceError::NotFound)
        ));

        ctx.service.set_publish(publication.id, true).await.unwrap();
        assert!(ctx.service.get_published(publication.id).await.is_ok());
    }
}
