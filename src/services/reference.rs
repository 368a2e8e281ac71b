//! Reference (citation) management

use std::sync::Arc;

use thiserror::Error;

use crate::cache::Cache;
use crate::db::repositories::ReferenceRepository;
use crate::models::{
    CreateReferenceInput, ListParams, PagedResult, Reference, UpdateReferenceInput,
};
use crate::services::validate::{FieldError, Validator};

#[derive(Debug, Error)]
pub enum ReferenceServiceError {
    #[error("Reference not found")]
    NotFound,
    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

const CACHE_PREFIX: &str = "references:";

pub struct ReferenceService {
    repo: Arc<dyn ReferenceRepository>,
    cache: Arc<Cache>,
}

impl ReferenceService {
    pub fn new(repo: Arc<dyn ReferenceRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(
        &self,
        input: CreateReferenceInput,
    ) -> Result<Reference, ReferenceServiceError> {
        let mut v = Validator::new();
        v.require("ar_title", &input.ar_title);
        v.require("en_title", &input.en_title);
        v.require("link", &input.link);
        v.finish().map_err(ReferenceServiceError::ValidationError)?;

        let reference = self.repo.create(&input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(reference)
    }

    pub async fn get(&self, id: i64) -> Result<Reference, ReferenceServiceError> {
        let key = format!("{CACHE_PREFIX}id:{id}");
        if let Some(cached) = self.cache.get::<Reference>(&key).await {
            return Ok(cached);
        }
        let reference = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(ReferenceServiceError::NotFound)?;
        self.cache.set(&key, &reference).await;
        Ok(reference)
    }

    pub async fn list(
        &self,
        params: ListParams,
        q: Option<String>,
    ) -> Result<PagedResult<Reference>, ReferenceServiceError> {
        let key = format!(
            "{CACHE_PREFIX}list:{}:{}:{}",
            params.page,
            params.per_page,
            q.as_deref().unwrap_or("")
        );
        if let Some(cached) = self.cache.get::<PagedResult<Reference>>(&key).await {
            return Ok(cached);
        }

        let items = self
            .repo
            .list(params.offset(), params.limit(), q.as_deref())
            .await?;
        let total = self.repo.count(q.as_deref()).await?;
        let result = PagedResult::new(items, total, &params);
        self.cache.set(&key, &result).await;
        Ok(result)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateReferenceInput,
    ) -> Result<Reference, ReferenceServiceError> {
        let mut v = Validator::new();
        if let Some(title) = &input.ar_title {
            v.require("ar_title", title);
        }
        if let Some(title) = &input.en_title {
            v.require("en_title", title);
        }
        if let Some(link) = &input.link {
            v.require("link", link);
        }
        v.finish().map_err(ReferenceServiceError::ValidationError)?;

        let existing = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(ReferenceServiceError::NotFound)?;
        if input.ar_title.is_none() && input.en_title.is_none() && input.link.is_none() {
            return Ok(existing);
        }

        let reference = self.repo.update(id, &input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(reference)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ReferenceServiceError> {
        let deleted = self.repo.delete(id).await?;
        if !deleted {
            return Err(ReferenceServiceError::NotFound);
        }
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::migrations::run_migrations;
    use crate::db::repositories::SqlxReferenceRepository;
    use crate::db::create_test_pool;

    async fn setup() -> ReferenceService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        ReferenceService::new(
            SqlxReferenceRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_create_requires_link() {
        let service = setup().await;
        let err = service
            .create(CreateReferenceInput {
                ar_title: "تقرير المنظمة".to_string(),
                en_title: "Organization Report".to_string(),
                link: "".to_string(),
            })
            .await
            .unwrap_err();
        match err {
            ReferenceServiceError::ValidationError(errors) => {
                assert_eq!(errors[0].field, "link");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let service = setup().await;
        let reference = service
            .create(CreateReferenceInput {
                ar_title: "تقرير المنظمة".to_string(),
                en_title: "Organization Report".to_string(),
                link: "https://example.org/report".to_string(),
            })
            .await
            .unwrap();

        service.delete(reference.id).await.unwrap();
        assert!(matches!(
            service.delete(reference.id).await,
            Err(ReferenceServiceError::NotFound)
        ));
    }
}
