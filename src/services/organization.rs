//! Partner organization management

use std::sync::Arc;

use thiserror::Error;

use crate::cache::Cache;
use crate::db::repositories::OrganizationRepository;
use crate::models::{
    CreateOrganizationInput, ListParams, Organization, PagedResult, UpdateOrganizationInput,
};
use crate::services::validate::{FieldError, Validator};

#[derive(Debug, Error)]
pub enum OrganizationServiceError {
    #[error("Organization not found")]
    NotFound,
    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

const CACHE_PREFIX: &str = "organizations:";

pub struct OrganizationService {
    repo: Arc<dyn OrganizationRepository>,
    cache: Arc<Cache>,
}

impl OrganizationService {
    pub fn new(repo: Arc<dyn OrganizationRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(
        &self,
        input: CreateOrganizationInput,
    ) -> Result<Organization, OrganizationServiceError> {
        let mut v = Validator::new();
        v.require("ar_name", &input.ar_name);
        v.require("en_name", &input.en_name);
        v.require("link", &input.link);
        v.finish()
            .map_err(OrganizationServiceError::ValidationError)?;

        let org = self.repo.create(&input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(org)
    }

    pub async fn get(&self, id: i64) -> Result<Organization, OrganizationServiceError> {
        let key = format!("{CACHE_PREFIX}id:{id}");
        if let Some(cached) = self.cache.get::<Organization>(&key).await {
            return Ok(cached);
        }
        let org = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(OrganizationServiceError::NotFound)?;
        self.cache.set(&key, &org).await;
        Ok(org)
    }

    pub async fn list(
        &self,
        params: ListParams,
        q: Option<String>,
    ) -> Result<PagedResult<Organization>, OrganizationServiceError> {
        let key = format!(
            "{CACHE_PREFIX}list:{}:{}:{}",
            params.page,
            params.per_page,
            q.as_deref().unwrap_or("")
        );
        if let Some(cached) = self.cache.get::<PagedResult<Organization>>(&key).await {
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
        input: UpdateOrganizationInput,
    ) -> Result<Organization, OrganizationServiceError> {
        let mut v = Validator::new();
        if let Some(name) = &input.ar_name {
            v.require("ar_name", name);
        }
        if let Some(name) = &input.en_name {
            v.require("en_name", name);
        }
        if let Some(link) = &input.link {
            v.require("link", link);
        }
        v.finish()
            .map_err(OrganizationServiceError::ValidationError)?;

        let existing = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(OrganizationServiceError::NotFound)?;
        let has_changes = input.ar_name.is_some()
            || input.en_name.is_some()
            || input.image.is_some()
            || input.link.is_some();
        if !has_changes {
            return Ok(existing);
        }

        let org = self.repo.update(id, &input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(org)
    }

    pub async fn delete(&self, id: i64) -> Result<(), OrganizationServiceError> {
        let deleted = self.repo.delete(id).await?;
        if !deleted {
            return Err(OrganizationServiceError::NotFound);
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
    use crate::db::repositories::SqlxOrganizationRepository;
    use crate::db::create_test_pool;

    async fn setup() -> OrganizationService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        OrganizationService::new(
            SqlxOrganizationRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_missing_names() {
        let service = setup().await;
        let err = service
            .create(CreateOrganizationInput {
                ar_name: "مركز الدراسات".to_string(),
                en_name: "".to_string(),
                image: None,
                link: "https://studies.example".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrganizationServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_cached_get_is_refreshed_after_update() {
        let service = setup().await;
        let org = service
            .create(CreateOrganizationInput {
                ar_name: "مركز الدراسات".to_string(),
                en_name: "Studies Center".to_string(),
                image: None,
                link: "https://studies.example".to_string(),
            })
            .await
            .unwrap();

        // Prime the cache, then mutate
        assert_eq!(service.get(org.id).await.unwrap().en_name, "Studies Center");
        service
            .update(
                org.id,
                UpdateOrganizationInput {
                    en_name: Some("Center for Studies".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            service.get(org.id).await.unwrap().en_name,
            "Center for Studies"
        );
    }
}
