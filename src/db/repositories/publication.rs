//! Publication repository
//!
//! Database operations for publications and all their relational
//! data: gallery images, tags, writer and reference associations,
//! and the optional report link. Every write that spans the base row
//! and relation rows runs in one transaction, so a publication can
//! never be observed with half its relations applied.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{
    CreatePublicationInput, Publication, PublicationKind, PublicationRelationsInput, SortOrder,
    UpdatePublicationInput,
};

/// Filters applied to publication list queries
#[derive(Debug, Clone, Default)]
pub struct PublicationFilter {
    /// Case-sensitive substring match on either-language title
    pub q: Option<String>,
    /// Restrict to a publish state
    pub publish: Option<bool>,
    /// Restrict to a kind
    pub kind: Option<PublicationKind>,
    /// Sort direction by publish date
    pub sort: SortOrder,
}

/// Publication repository trait
#[async_trait]
pub trait PublicationRepository: Send + Sync {
    /// Create a publication together with gallery, tags, and relations
    async fn create(&self, input: &CreatePublicationInput) -> Result<Publication>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Publication>>;
    async fn list(
        &self,
        offset: i64,
        limit: i64,
        filter: &PublicationFilter,
    ) -> Result<Vec<Publication>>;
    async fn count(&self, filter: &PublicationFilter) -> Result<i64>;
    /// Update base fields (and the gallery when provided)
    async fn update(&self, id: i64, input: &UpdatePublicationInput) -> Result<Publication>;
    /// Replace relational data atomically (replace-all semantics)
    async fn replace_relations(
        &self,
        id: i64,
        input: &PublicationRelationsInput,
    ) -> Result<Publication>;
    /// Flip only the publish flag
    async fn set_publish(&self, id: i64, publish: bool) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based publication repository implementation
pub struct SqlxPublicationRepository {
    pool: SqlitePool,
}

impl SqlxPublicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn PublicationRepository> {
        Arc::new(Self::new(pool))
    }

    async fn attach_relations(&self, publication: &mut Publication) -> Result<()> {
        let id = publication.id;

        let rows = sqlx::query(
            "SELECT url FROM publication_gallery WHERE publication_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch gallery")?;
        publication.gallery = rows.iter().map(|r| r.get("url")).collect();

        let rows = sqlx::query(
            "SELECT tag FROM publication_tags WHERE publication_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch tags")?;
        publication.tags = rows.iter().map(|r| r.get("tag")).collect();

        let rows = sqlx::query(
            "SELECT writer_id FROM publication_writers WHERE publication_id = ? ORDER BY writer_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch writer associations")?;
        publication.writer_ids = rows.iter().map(|r| r.get("writer_id")).collect();

        let rows = sqlx::query(
            "SELECT reference_id FROM publication_references WHERE publication_id = ? ORDER BY reference_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch reference associations")?;
        publication.reference_ids = rows.iter().map(|r| r.get("reference_id")).collect();

        Ok(())
    }
}

#[async_trait]
impl PublicationRepository for SqlxPublicationRepository {
    async fn create(&self, input: &CreatePublicationInput) -> Result<Publication> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO publications (
                kind, ar_title, en_title, ar_description, en_description,
                ar_note, en_note, image, time_to_read, publish,
                date_of_publish, report_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(input.kind.as_str())
        .bind(&input.ar_title)
        .bind(&input.en_title)
        .bind(&input.ar_description)
        .bind(&input.en_description)
        .bind(&input.ar_note)
        .bind(&input.en_note)
        .bind(&input.image)
        .bind(input.time_to_read)
        .bind(input.date_of_publish)
        .bind(input.report_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert publication")?;

        let id = result.last_insert_rowid();

        insert_gallery(&mut tx, id, &input.gallery).await?;
        insert_tags(&mut tx, id, &input.tags).await?;
        insert_writer_links(&mut tx, id, &input.writer_ids).await?;
        insert_reference_links(&mut tx, id, &input.reference_ids).await?;

        tx.commit()
            .await
            .context("Failed to commit publication create")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Publication not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Publication>> {
        let row = sqlx::query("SELECT * FROM publications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get publication by id")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut publication = row_to_publication(&row)?;
        self.attach_relations(&mut publication).await?;
        Ok(Some(publication))
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
        filter: &PublicationFilter,
    ) -> Result<Vec<Publication>> {
        let sql = format!(
            r#"
            SELECT * FROM publications
            WHERE (?1 IS NULL OR instr(ar_title, ?1) > 0 OR instr(en_title, ?1) > 0)
              AND (?2 IS NULL OR publish = ?2)
              AND (?3 IS NULL OR kind = ?3)
            ORDER BY date_of_publish {}, id {}
            LIMIT ?4 OFFSET ?5
            "#,
            filter.sort.sql(),
            filter.sort.sql(),
        );

        let rows = sqlx::query(&sql)
            .bind(&filter.q)
            .bind(filter.publish)
            .bind(filter.kind.map(|k| k.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list publications")?;

        let mut publications = Vec::with_capacity(rows.len());
        for row in rows {
            let mut publication = row_to_publication(&row)?;
            self.attach_relations(&mut publication).await?;
            publications.push(publication);
        }
        Ok(publications)
    }

    async fn count(&self, filter: &PublicationFilter) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM publications
            WHERE (?1 IS NULL OR instr(ar_title, ?1) > 0 OR instr(en_title, ?1) > 0)
              AND (?2 IS NULL OR publish = ?2)
              AND (?3 IS NULL OR kind = ?3)
            "#,
        )
        .bind(&filter.q)
        .bind(filter.publish)
        .bind(filter.kind.map(|k| k.as_str()))
        .fetch_one(&self.pool)
        .await
        .context("Failed to count publications")?;

        Ok(row.get("count"))
    }

    async fn update(&self, id: i64, input: &UpdatePublicationInput) -> Result<Publication> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Publication not found: {id}"))?;

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            UPDATE publications
            SET kind = ?, ar_title = ?, en_title = ?, ar_description = ?, en_description = ?,
                ar_note = ?, en_note = ?, image = ?, date_of_publish = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.kind.unwrap_or(existing.kind).as_str())
        .bind(input.ar_title.as_ref().unwrap_or(&existing.ar_title))
        .bind(input.en_title.as_ref().unwrap_or(&existing.en_title))
        .bind(
            input
                .ar_description
                .as_ref()
                .unwrap_or(&existing.ar_description),
        )
        .bind(
            input
                .en_description
                .as_ref()
                .unwrap_or(&existing.en_description),
        )
        .bind(input.ar_note.as_ref().unwrap_or(&existing.ar_note))
        .bind(input.en_note.as_ref().unwrap_or(&existing.en_note))
        .bind(input.image.clone().or(existing.image.clone()))
        .bind(input.date_of_publish.unwrap_or(existing.date_of_publish))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update publication")?;

        if let Some(gallery) = &input.gallery {
            sqlx::query("DELETE FROM publication_gallery WHERE publication_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear gallery")?;
            insert_gallery(&mut tx, id, gallery).await?;
        }

        tx.commit()
            .await
            .context("Failed to commit publication update")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Publication not found after update"))
    }

    async fn replace_relations(
        &self,
        id: i64,
        input: &PublicationRelationsInput,
    ) -> Result<Publication> {
        let exists = sqlx::query("SELECT id FROM publications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check publication")?
            .is_some();
        if !exists {
            anyhow::bail!("Publication not found: {id}");
        }

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        if let Some(tags) = &input.tags {
            sqlx::query("DELETE FROM publication_tags WHERE publication_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear tags")?;
            insert_tags(&mut tx, id, tags).await?;
        }

        if let Some(writer_ids) = &input.writer_ids {
            sqlx::query("DELETE FROM publication_writers WHERE publication_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear writer associations")?;
            insert_writer_links(&mut tx, id, writer_ids).await?;
        }

        if let Some(reference_ids) = &input.reference_ids {
            sqlx::query("DELETE FROM publication_references WHERE publication_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to clear reference associations")?;
            insert_reference_links(&mut tx, id, reference_ids).await?;
        }

        if let Some(time_to_read) = input.time_to_read {
            sqlx::query("UPDATE publications SET time_to_read = ? WHERE id = ?")
                .bind(time_to_read)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to update time to read")?;
        }

        if let Some(report_id) = input.report_id {
            sqlx::query("UPDATE publications SET report_id = ? WHERE id = ?")
                .bind(report_id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to update report link")?;
        }

        sqlx::query("UPDATE publications SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to touch publication")?;

        tx.commit()
            .await
            .context("Failed to commit relation update")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Publication not found after relation update"))
    }

    async fn set_publish(&self, id: i64, publish: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE publications SET publish = ?, updated_at = ? WHERE id = ?")
                .bind(publish)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to set publication publish flag")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM publications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete publication")?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_gallery(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    publication_id: i64,
    urls: &[String],
) -> Result<()> {
    for (position, url) in urls.iter().enumerate() {
        sqlx::query(
            "INSERT INTO publication_gallery (publication_id, url, position) VALUES (?, ?, ?)",
        )
        .bind(publication_id)
        .bind(url)
        .bind(position as i64)
        .execute(&mut **tx)
        .await
        .context("Failed to insert gallery image")?;
    }
    Ok(())
}

async fn insert_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    publication_id: i64,
    tags: &[String],
) -> Result<()> {
    for (position, tag) in tags.iter().enumerate() {
        sqlx::query(
            "INSERT INTO publication_tags (publication_id, tag, position) VALUES (?, ?, ?)",
        )
        .bind(publication_id)
        .bind(tag)
        .bind(position as i64)
        .execute(&mut **tx)
        .await
        .context("Failed to insert tag")?;
    }
    Ok(())
}

async fn insert_writer_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    publication_id: i64,
    writer_ids: &[i64],
) -> Result<()> {
    for writer_id in writer_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO publication_writers (publication_id, writer_id) VALUES (?, ?)",
        )
        .bind(publication_id)
        .bind(writer_id)
        .execute(&mut **tx)
        .await
        .context("Failed to link writer")?;
    }
    Ok(())
}

async fn insert_reference_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    publication_id: i64,
    reference_ids: &[i64],
) -> Result<()> {
    for reference_id in reference_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO publication_references (publication_id, reference_id) VALUES (?, ?)",
        )
        .bind(publication_id)
        .bind(reference_id)
        .execute(&mut **tx)
        .await
        .context("Failed to link reference")?;
    }
    Ok(())
}

fn row_to_publication(row: &sqlx::sqlite::SqliteRow) -> Result<Publication> {
    let kind: String = row.get("kind");
    let kind = PublicationKind::from_str(&kind)
        .ok_or_else(|| anyhow::anyhow!("Unknown publication kind: {kind}"))?;

    Ok(Publication {
        id: row.get("id"),
        kind,
        ar_title: row.get("ar_title"),
        en_title: row.get("en_title"),
        ar_description: row.get("ar_description"),
        en_description: row.get("en_description"),
        ar_note: row.get("ar_note"),
        en_note: row.get("en_note"),
        image: row.get("image"),
        gallery: Vec::new(),
        tags: Vec::new(),
        time_to_read: row.get("time_to_read"),
        publish: row.get("publish"),
        date_of_publish: row.get("date_of_publish"),
        writer_ids: Vec::new(),
        reference_ids: Vec::new(),
        report_id: row.get("report_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::writer::{SqlxWriterRepository, WriterRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateWriterInput;
    use chrono::NaiveDate;

    async fn setup() -> (SqlitePool, SqlxPublicationRepository) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        (pool.clone(), SqlxPublicationRepository::new(pool))
    }

    async fn create_writer(pool: &SqlitePool) -> i64 {
        let repo = SqlxWriterRepository::new(pool.clone());
        repo.create(&CreateWriterInput {
            ar_full_name: "كاتب".to_string(),
            en_full_name: "Writer".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
    }

    fn sample_input() -> CreatePublicationInput {
        CreatePublicationInput {
            kind: PublicationKind::Analysis,
            ar_title: "تحليل".to_string(),
            en_title: "Deep Analysis".to_string(),
            ar_description: "نص".to_string(),
            en_description: "Body".to_string(),
            ar_note: String::new(),
            en_note: String::new(),
            image: Some("/uploads/hero.jpg".to_string()),
            gallery: vec!["/uploads/a.jpg".to_string(), "/uploads/b.jpg".to_string()],
            tags: vec!["economy".to_string(), "policy".to_string()],
            time_to_read: Some(7),
            date_of_publish: NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
            writer_ids: Vec::new(),
            reference_ids: Vec::new(),
            report_id: None,
        }
    }

    #[tokio::test]
    async fn test_composite_create() {
        let (pool, repo) = setup().await;
        let writer_id = create_writer(&pool).await;

        let mut input = sample_input();
        input.writer_ids = vec![writer_id];
        let publication = repo.create(&input).await.unwrap();

        assert_eq!(publication.kind, PublicationKind::Analysis);
        assert_eq!(publication.gallery.len(), 2);
        assert_eq!(publication.tags, vec!["economy", "policy"]);
        assert_eq!(publication.writer_ids, vec![writer_id]);
        assert!(!publication.publish);
    }

    #[tokio::test]
    async fn test_composite_create_rolls_back_on_bad_relation() {
        let (_pool, repo) = setup().await;

        let mut input = sample_input();
        input.writer_ids = vec![4242]; // no such writer, FK rejects
        assert!(repo.create(&input).await.is_err());

        // Nothing was left behind
        let filter = PublicationFilter::default();
        assert_eq!(repo.count(&filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_relations_is_replace_all() {
        let (pool, repo) = setup().await;
        let writer_id = create_writer(&pool).await;
        let publication = repo.create(&sample_input()).await.unwrap();

        let updated = repo
            .replace_relations(
                publication.id,
                &PublicationRelationsInput {
                    tags: Some(vec!["fresh".to_string()]),
                    time_to_read: Some(12),
                    writer_ids: Some(vec![writer_id]),
                    reference_ids: Some(Vec::new()),
                    report_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.tags, vec!["fresh"]);
        assert_eq!(updated.time_to_read, Some(12));
        assert_eq!(updated.writer_ids, vec![writer_id]);
        assert!(updated.reference_ids.is_empty());
    }

    #[tokio::test]
    async fn test_replace_relations_rolls_back_on_bad_writer() {
        let (_pool, repo) = setup().await;
        let publication = repo.create(&sample_input()).await.unwrap();

        let result = repo
            .replace_relations(
                publication.id,
                &PublicationRelationsInput {
                    tags: Some(vec!["new-tag".to_string()]),
                    writer_ids: Some(vec![999]), // FK failure after tags were replaced
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());

        // Tag replacement rolled back with the failed writer link
        let after = repo.get_by_id(publication.id).await.unwrap().unwrap();
        assert_eq!(after.tags, vec!["economy", "policy"]);
    }

    #[tokio::test]
    async fn test_title_filter_case_sensitive() {
        let (_pool, repo) = setup().await;
        repo.create(&sample_input()).await.unwrap();

        let filter = PublicationFilter {
            q: Some("Deep".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);

        let filter = PublicationFilter {
            q: Some("deep".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_publish_flips_only_the_flag() {
        let (_pool, repo) = setup().await;
        let publication = repo.create(&sample_input()).await.unwrap();

        assert!(repo.set_publish(publication.id, true).await.unwrap());

        let after = repo.get_by_id(publication.id).await.unwrap().unwrap();
        assert!(after.publish);
        assert_eq!(after.en_title, publication.en_title);
        assert_eq!(after.tags, publication.tags);
        assert_eq!(after.gallery, publication.gallery);
        assert_eq!(after.time_to_read, publication.time_to_read);
    }

    #[tokio::test]
    async fn test_delete_is_effective_once() {
        let (_pool, repo) = setup().await;
        let publication = repo.create(&sample_input()).await.unwrap();

        assert!(repo.delete(publication.id).await.unwrap());
        assert!(!repo.delete(publication.id).await.unwrap());
    }
}
