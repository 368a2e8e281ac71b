//! Writer profile management

use std::sync::Arc;

use thiserror::Error;

use crate::cache::Cache;
use crate::db::repositories::WriterRepository;
use crate::models::{
    CreateWriterInput, ListParams, PagedResult, SocialLink, UpdateWriterInput, Writer,
};
use crate::services::validate::{FieldError, Validator};

#[derive(Debug, Error)]
pub enum WriterServiceError {
    #[error("Writer not found")]
    NotFound,
    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

const CACHE_PREFIX: &str = "writers:";

pub struct WriterService {
    repo: Arc<dyn WriterRepository>,
    cache: Arc<Cache>,
}

impl WriterService {
    pub fn new(repo: Arc<dyn WriterRepository>, cache: Arc<Cache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create(&self, input: CreateWriterInput) -> Result<Writer, WriterServiceError> {
        let mut v = Validator::new();
        v.require("ar_full_name", &input.ar_full_name);
        v.require("en_full_name", &input.en_full_name);
        validate_social_links(&mut v, &input.social_links);
        v.finish().map_err(WriterServiceError::ValidationError)?;

        let writer = self.repo.create(&input).await?;
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(writer)
    }

    pub async fn get(&self, id: i64) -> Result<Writer, WriterServiceError> {
        let key = format!("{CACHE_PREFIX}id:{id}");
        if let Some(cached) = self.cache.get::<Writer>(&key).await {
            return Ok(cached);
        }
        let writer = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(WriterServiceError::NotFound)?;
        self.cache.set(&key, &writer).await;
        Ok(writer)
    }

    pub async fn list(
        &self,
        params: ListParams,
        q: Option<String>,
    ) -> Result<PagedResult<Writer>, WriterServiceError> {
        let key = format!(
            "{CACHE_PREFIX}list:{}:{}:{}",
            params.page,
            params.per_page,
            q.as_deref().unwrap_or("")
        );
        if let Some(cached) = self.cache.get::<PagedResult<Writer>>(&key).await {
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

    /// Update base fields and, when a list is provided, replace the
    /// social links wholesale.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateWriterInput,
        social_links: Option<Vec<SocialLink>>,
    ) -> Result<Writer, WriterServiceError> {
        let mut v = Validator::new();
        if let Some(name) = &input.ar_full_name {
            v.require("ar_full_name", name);
        }
        if let Some(name) = &input.en_full_name {
            v.require("en_full_name", name);
        }
        if let Some(links) = &social_links {
            validate_social_links(&mut v, links);
        }
        v.finish().map_err(WriterServiceError::ValidationError)?;

        let existing = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(WriterServiceError::NotFound)?;

        if input.has_changes() {
            self.repo.update(id, &input).await?;
        }
        if let Some(links) = &social_links {
            self.repo.replace_social_links(id, links).await?;
        } else if !input.has_changes() {
            return Ok(existing);
        }

        self.cache.delete_prefix(CACHE_PREFIX).await;
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(WriterServiceError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), WriterServiceError> {
        let deleted = self.repo.delete(id).await?;
        if !deleted {
            return Err(WriterServiceError::NotFound);
        }
        self.cache.delete_prefix(CACHE_PREFIX).await;
        Ok(())
    }
}

fn validate_social_links(v: &mut Validator, links: &[SocialLink]) {
    for (i, link) in links.iter().enumerate() {
        if link.name.trim().is_empty() || link.url.trim().is_empty() {
            v.push(
                "social_links",
                format!("entry {i} must have both a name and a url"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::migrations::run_migrations;
    use crate::db::repositories::SqlxWriterRepository;
    use crate::db::create_test_pool;

    async fn setup() -> WriterService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        WriterService::new(
            SqlxWriterRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        )
    }

    fn sample_input() -> CreateWriterInput {
        CreateWriterInput {
            ar_full_name: "سارة الخالد".to_string(),
            en_full_name: "Sara Alkhaled".to_string(),
            ar_description: "باحثة".to_string(),
            en_description: "Researcher".to_string(),
            ar_role: "محررة".to_string(),
            en_role: "Editor".to_string(),
            image: None,
            social_links: vec![SocialLink {
                name: "x".to_string(),
                url: "https://x.com/sara".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_create_requires_both_names() {
        let service = setup().await;
        let mut input = sample_input();
        input.en_full_name = "  ".to_string();

        let err = service.create(input).await.unwrap_err();
        match err {
            WriterServiceError::ValidationError(errors) => {
                assert_eq!(errors[0].field, "en_full_name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_social_links() {
        let service = setup().await;
        let writer = service.create(sample_input()).await.unwrap();

        let links = vec![
            SocialLink {
                name: "linkedin".to_string(),
                url: "https://linkedin.com/in/sara".to_string(),
            },
            SocialLink {
                name: "instagram".to_string(),
                url: "https://instagram.com/sara".to_string(),
            },
        ];
        let updated = service
            .update(writer.id, UpdateWriterInput::default(), Some(links.clone()))
            .await
            .unwrap();
        assert_eq!(updated.social_links, links);
    }

    #[tokio::test]
    async fn test_update_without_changes_returns_current_row() {
        let service = setup().await;
        let writer = service.create(sample_input()).await.unwrap();

        let same = service
            .update(writer.id, UpdateWriterInput::default(), None)
            .await
            .unwrap();
        assert_eq!(same.en_full_name, writer.en_full_name);
    }

    #[tokio::test]
    async fn test_get_after_delete_is_not_found() {
        let service = setup().await;
        let writer = service.create(sample_input()).await.unwrap();

        service.delete(writer.id).await.unwrap();
        assert!(matches!(
            service.get(writer.id).await,
            Err(WriterServiceError::NotFound)
        ));
        assert!(matches!(
            service.delete(writer.id).await,
            Err(WriterServiceError::NotFound)
        ));
    }
}
