//! Reference repository
//!
//! The `references` table name is quoted everywhere because it is a
//! SQL keyword.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{CreateReferenceInput, Reference, UpdateReferenceInput};

/// Reference repository trait
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn create(&self, input: &CreateReferenceInput) -> Result<Reference>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Reference>>;
    async fn list(&self, offset: i64, limit: i64, q: Option<&str>) -> Result<Vec<Reference>>;
    async fn count(&self, q: Option<&str>) -> Result<i64>;
    async fn update(&self, id: i64, input: &UpdateReferenceInput) -> Result<Reference>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Check that every id in the list exists
    async fn all_exist(&self, ids: &[i64]) -> Result<bool>;
}

/// SQLx-based reference repository implementation
pub struct SqlxReferenceRepository {
    pool: SqlitePool,
}

impl SqlxReferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ReferenceRepository> {
        Arc::new(Self::new(pool))
    }

    async fn citing_publications(&self, reference_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT publication_id FROM publication_references WHERE reference_id = ? ORDER BY publication_id",
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch citing publications")?;

        Ok(rows.iter().map(|r| r.get("publication_id")).collect())
    }
}

#[async_trait]
impl ReferenceRepository for SqlxReferenceRepository {
    async fn create(&self, input: &CreateReferenceInput) -> Result<Reference> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO "references" (ar_title, en_title, link, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.ar_title)
        .bind(&input.en_title)
        .bind(&input.link)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert reference")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Reference not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Reference>> {
        let row = sqlx::query(r#"SELECT * FROM "references" WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get reference by id")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut reference = row_to_reference(&row)?;
        reference.publication_ids = self.citing_publications(id).await?;
        Ok(Some(reference))
    }

    async fn list(&self, offset: i64, limit: i64, q: Option<&str>) -> Result<Vec<Reference>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM "references"
            WHERE (?1 IS NULL OR instr(ar_title, ?1) > 0 OR instr(en_title, ?1) > 0)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(q)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list references")?;

        let mut references = Vec::with_capacity(rows.len());
        for row in rows {
            let mut reference = row_to_reference(&row)?;
            reference.publication_ids = self.citing_publications(reference.id).await?;
            references.push(reference);
        }
        Ok(references)
    }

    async fn count(&self, q: Option<&str>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM "references"
            WHERE (?1 IS NULL OR instr(ar_title, ?1) > 0 OR instr(en_title, ?1) > 0)
            "#,
        )
        .bind(q)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count references")?;

        Ok(row.get("count"))
    }

    async fn update(&self, id: i64, input: &UpdateReferenceInput) -> Result<Reference> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Reference not found: {id}"))?;

        let ar_title = input.ar_title.as_ref().unwrap_or(&existing.ar_title);
        let en_title = input.en_title.as_ref().unwrap_or(&existing.en_title);
        let link = input.link.as_ref().unwrap_or(&existing.link);

        sqlx::query(
            r#"UPDATE "references" SET ar_title = ?, en_title = ?, link = ?, updated_at = ? WHERE id = ?"#,
        )
        .bind(ar_title)
        .bind(en_title)
        .bind(link)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update reference")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Reference not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM "references" WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete reference")?;

        Ok(result.rows_affected() > 0)
    }

    async fn all_exist(&self, ids: &[i64]) -> Result<bool> {
        if ids.is_empty() {
            return Ok(true);
        }

        // IN collapses duplicates, so compare against the distinct count
        let unique: std::collections::BTreeSet<i64> = ids.iter().copied().collect();
        let placeholders = vec!["?"; unique.len()].join(", ");
        let sql =
            format!(r#"SELECT COUNT(*) as count FROM "references" WHERE id IN ({placeholders})"#);

        let mut query = sqlx::query(&sql);
        for id in &unique {
            query = query.bind(id);
        }

        let row = query
            .fetch_one(&self.pool)
            .await
            .context("Failed to check reference ids")?;

        let count: i64 = row.get("count");
        Ok(count == unique.len() as i64)
    }
}

fn row_to_reference(row: &sqlx::sqlite::SqliteRow) -> Result<Reference> {
    Ok(Reference {
        id: row.get("id"),
        ar_title: row.get("ar_title"),
        en_title: row.get("en_title"),
        link: row.get("link"),
        publication_ids: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxReferenceRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxReferenceRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_count() {
        let repo = setup().await;

        repo.create(&CreateReferenceInput {
            ar_title: "مصدر".to_string(),
            en_title: "UN Report 2025".to_string(),
            link: "https://un.org/report".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(repo.count(None).await.unwrap(), 1);
        assert_eq!(repo.count(Some("UN")).await.unwrap(), 1);
        assert_eq!(repo.count(Some("un report")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_all_exist() {
        let repo = setup().await;
        let r = repo
            .create(&CreateReferenceInput {
                ar_title: "مصدر".to_string(),
                en_title: "Source".to_string(),
                link: String::new(),
            })
            .await
            .unwrap();

        assert!(repo.all_exist(&[r.id]).await.unwrap());
        assert!(repo.all_exist(&[]).await.unwrap());
        assert!(!repo.all_exist(&[r.id, 999]).await.unwrap());
        // A repeated valid id is still valid
        assert!(repo.all_exist(&[r.id, r.id]).await.unwrap());
    }
}
