//! Writer repository
//!
//! Database operations for writers and their social-media links.
//! Creates and updates that touch the link list run inside one
//! transaction with the base row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{CreateWriterInput, SocialLink, UpdateWriterInput, Writer};

/// Writer repository trait
#[async_trait]
pub trait WriterRepository: Send + Sync {
    /// Create a new writer with its social links
    async fn create(&self, input: &CreateWriterInput) -> Result<Writer>;

    /// Get writer by ID, including social links
    async fn get_by_id(&self, id: i64) -> Result<Option<Writer>>;

    /// List writers with pagination and optional name filter
    async fn list(&self, offset: i64, limit: i64, q: Option<&str>) -> Result<Vec<Writer>>;

    /// Count writers matching the optional name filter
    async fn count(&self, q: Option<&str>) -> Result<i64>;

    /// Update a writer's base fields
    async fn update(&self, id: i64, input: &UpdateWriterInput) -> Result<Writer>;

    /// Replace a writer's social links with exactly the given list
    async fn replace_social_links(&self, id: i64, links: &[SocialLink]) -> Result<()>;

    /// Delete a writer (links cascade)
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check that every id in the list exists
    async fn all_exist(&self, ids: &[i64]) -> Result<bool>;
}

/// SQLx-based writer repository implementation
pub struct SqlxWriterRepository {
    pool: SqlitePool,
}

impl SqlxWriterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn WriterRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl WriterRepository for SqlxWriterRepository {
    async fn create(&self, input: &CreateWriterInput) -> Result<Writer> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO writers (ar_full_name, en_full_name, ar_description, en_description, ar_role, en_role, image, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.ar_full_name)
        .bind(&input.en_full_name)
        .bind(&input.ar_description)
        .bind(&input.en_description)
        .bind(&input.ar_role)
        .bind(&input.en_role)
        .bind(&input.image)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert writer")?;

        let id = result.last_insert_rowid();

        insert_social_links(&mut tx, id, &input.social_links).await?;

        tx.commit().await.context("Failed to commit writer create")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Writer not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Writer>> {
        let row = sqlx::query("SELECT * FROM writers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get writer by id")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut writer = row_to_writer(&row)?;
        writer.social_links = fetch_social_links(&self.pool, id).await?;
        Ok(Some(writer))
    }

    async fn list(&self, offset: i64, limit: i64, q: Option<&str>) -> Result<Vec<Writer>> {
        // instr() keeps the filter case-sensitive; LIKE folds ASCII case
        let rows = sqlx::query(
            r#"
            SELECT * FROM writers
            WHERE (?1 IS NULL OR instr(ar_full_name, ?1) > 0 OR instr(en_full_name, ?1) > 0)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(q)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list writers")?;

        let mut writers = Vec::with_capacity(rows.len());
        for row in rows {
            let mut writer = row_to_writer(&row)?;
            writer.social_links = fetch_social_links(&self.pool, writer.id).await?;
            writers.push(writer);
        }
        Ok(writers)
    }

    async fn count(&self, q: Option<&str>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM writers
            WHERE (?1 IS NULL OR instr(ar_full_name, ?1) > 0 OR instr(en_full_name, ?1) > 0)
            "#,
        )
        .bind(q)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count writers")?;

        Ok(row.get("count"))
    }

    async fn update(&self, id: i64, input: &UpdateWriterInput) -> Result<Writer> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Writer not found: {id}"))?;

        let ar_full_name = input.ar_full_name.as_ref().unwrap_or(&existing.ar_full_name);
        let en_full_name = input.en_full_name.as_ref().unwrap_or(&existing.en_full_name);
        let ar_description = input
            .ar_description
            .as_ref()
            .unwrap_or(&existing.ar_description);
        let en_description = input
            .en_description
            .as_ref()
            .unwrap_or(&existing.en_description);
        let ar_role = input.ar_role.as_ref().unwrap_or(&existing.ar_role);
        let en_role = input.en_role.as_ref().unwrap_or(&existing.en_role);
        let image = input.image.clone().or(existing.image);

        sqlx::query(
            r#"
            UPDATE writers
            SET ar_full_name = ?, en_full_name = ?, ar_description = ?, en_description = ?,
                ar_role = ?, en_role = ?, image = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(ar_full_name)
        .bind(en_full_name)
        .bind(ar_description)
        .bind(en_description)
        .bind(ar_role)
        .bind(en_role)
        .bind(&image)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update writer")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Writer not found after update"))
    }

    async fn replace_social_links(&self, id: i64, links: &[SocialLink]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM writer_social_links WHERE writer_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear social links")?;

        insert_social_links(&mut tx, id, links).await?;

        sqlx::query("UPDATE writers SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to touch writer")?;

        tx.commit().await.context("Failed to commit social links")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM writers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete writer")?;

        Ok(result.rows_affected() > 0)
    }

    async fn all_exist(&self, ids: &[i64]) -> Result<bool> {
        if ids.is_empty() {
            return Ok(true);
        }

        // IN collapses duplicates, so compare against the distinct count
        let unique: std::collections::BTreeSet<i64> = ids.iter().copied().collect();
        let placeholders = vec!["?"; unique.len()].join(", ");
        let sql = format!("SELECT COUNT(*) as count FROM writers WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in &unique {
            query = query.bind(id);
        }

        let row = query
            .fetch_one(&self.pool)
            .await
            .context("Failed to check writer ids")?;

        let count: i64 = row.get("count");
        Ok(count == unique.len() as i64)
    }
}

async fn insert_social_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    writer_id: i64,
    links: &[SocialLink],
) -> Result<()> {
    for (position, link) in links.iter().enumerate() {
        sqlx::query(
            "INSERT INTO writer_social_links (writer_id, name, url, position) VALUES (?, ?, ?, ?)",
        )
        .bind(writer_id)
        .bind(&link.name)
        .bind(&link.url)
        .bind(position as i64)
        .execute(&mut **tx)
        .await
        .context("Failed to insert social link")?;
    }
    Ok(())
}

async fn fetch_social_links(pool: &SqlitePool, writer_id: i64) -> Result<Vec<SocialLink>> {
    let rows = sqlx::query(
        "SELECT name, url FROM writer_social_links WHERE writer_id = ? ORDER BY position",
    )
    .bind(writer_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch social links")?;

    Ok(rows
        .iter()
        .map(|row| SocialLink {
            name: row.get("name"),
            url: row.get("url"),
        })
        .collect())
}

fn row_to_writer(row: &sqlx::sqlite::SqliteRow) -> Result<Writer> {
    Ok(Writer {
        id: row.get("id"),
        ar_full_name: row.get("ar_full_name"),
        en_full_name: row.get("en_full_name"),
        ar_description: row.get("ar_description"),
        en_description: row.get("en_description"),
        ar_role: row.get("ar_role"),
        en_role: row.get("en_role"),
        image: row.get("image"),
        social_links: Vec::new(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }

    fn sample_input() -> CreateWriterInput {
        CreateWriterInput {
            ar_full_name: "كاتب تجريبي".to_string(),
            en_full_name: "Test Writer".to_string(),
            ar_description: "وصف".to_string(),
            en_description: "Bio".to_string(),
            ar_role: "محلل".to_string(),
            en_role: "Analyst".to_string(),
            image: None,
            social_links: vec![
                SocialLink {
                    name: "x".to_string(),
                    url: "https://x.com/test".to_string(),
                },
                SocialLink {
                    name: "linkedin".to_string(),
                    url: "https://linkedin.com/in/test".to_string(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_create_and_get_with_links() {
        let pool = setup().await;
        let repo = SqlxWriterRepository::new(pool);

        let writer = repo.create(&sample_input()).await.unwrap();
        assert!(writer.id > 0);
        assert_eq!(writer.social_links.len(), 2);
        assert_eq!(writer.social_links[0].name, "x");

        let fetched = repo.get_by_id(writer.id).await.unwrap().unwrap();
        assert_eq!(fetched.en_full_name, "Test Writer");
    }

    #[tokio::test]
    async fn test_replace_social_links_is_replace_all() {
        let pool = setup().await;
        let repo = SqlxWriterRepository::new(pool);
        let writer = repo.create(&sample_input()).await.unwrap();

        let new_links = vec![SocialLink {
            name: "instagram".to_string(),
            url: "https://instagram.com/test".to_string(),
        }];
        repo.replace_social_links(writer.id, &new_links).await.unwrap();

        let fetched = repo.get_by_id(writer.id).await.unwrap().unwrap();
        assert_eq!(fetched.social_links, new_links);
    }

    #[tokio::test]
    async fn test_list_filter_is_case_sensitive() {
        let pool = setup().await;
        let repo = SqlxWriterRepository::new(pool);
        repo.create(&sample_input()).await.unwrap();

        let hits = repo.list(0, 10, Some("Test")).await.unwrap();
        assert_eq!(hits.len(), 1);

        let misses = repo.list(0, 10, Some("test")).await.unwrap();
        assert!(misses.is_empty());

        let all = repo.list(0, 10, None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_reports_absence() {
        let pool = setup().await;
        let repo = SqlxWriterRepository::new(pool.clone());
        let writer = repo.create(&sample_input()).await.unwrap();

        assert!(repo.delete(writer.id).await.unwrap());
        assert!(!repo.delete(writer.id).await.unwrap());

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM writer_social_links")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 0);
    }

    #[tokio::test]
    async fn test_all_exist_tolerates_duplicate_ids() {
        let pool = setup().await;
        let repo = SqlxWriterRepository::new(pool);
        let writer = repo.create(&sample_input()).await.unwrap();

        assert!(repo.all_exist(&[writer.id, writer.id]).await.unwrap());
        assert!(!repo.all_exist(&[writer.id, writer.id, 999]).await.unwrap());
    }
}
