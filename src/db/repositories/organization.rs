//! Organization repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{CreateOrganizationInput, Organization, UpdateOrganizationInput};

/// Organization repository trait
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, input: &CreateOrganizationInput) -> Result<Organization>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Organization>>;
    async fn list(&self, offset: i64, limit: i64, q: Option<&str>) -> Result<Vec<Organization>>;
    async fn count(&self, q: Option<&str>) -> Result<i64>;
    async fn update(&self, id: i64, input: &UpdateOrganizationInput) -> Result<Organization>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based organization repository implementation
pub struct SqlxOrganizationRepository {
    pool: SqlitePool,
}

impl SqlxOrganizationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn OrganizationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl OrganizationRepository for SqlxOrganizationRepository {
    async fn create(&self, input: &CreateOrganizationInput) -> Result<Organization> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO organizations (ar_name, en_name, image, link, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.ar_name)
        .bind(&input.en_name)
        .bind(&input.image)
        .bind(&input.link)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to insert organization")?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Organization not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Organization>> {
        let row = sqlx::query("SELECT * FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get organization by id")?;

        row.map(|r| row_to_organization(&r)).transpose()
    }

    async fn list(&self, offset: i64, limit: i64, q: Option<&str>) -> Result<Vec<Organization>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM organizations
            WHERE (?1 IS NULL OR instr(ar_name, ?1) > 0 OR instr(en_name, ?1) > 0)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(q)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list organizations")?;

        rows.iter().map(row_to_organization).collect()
    }

    async fn count(&self, q: Option<&str>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM organizations
            WHERE (?1 IS NULL OR instr(ar_name, ?1) > 0 OR instr(en_name, ?1) > 0)
            "#,
        )
        .bind(q)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count organizations")?;

        Ok(row.get("count"))
    }

    async fn update(&self, id: i64, input: &UpdateOrganizationInput) -> Result<Organization> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Organization not found: {id}"))?;

        let ar_name = input.ar_name.as_ref().unwrap_or(&existing.ar_name);
        let en_name = input.en_name.as_ref().unwrap_or(&existing.en_name);
        let image = input.image.clone().or(existing.image);
        let link = input.link.as_ref().unwrap_or(&existing.link);

        sqlx::query(
            r#"
            UPDATE organizations
            SET ar_name = ?, en_name = ?, image = ?, link = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(ar_name)
        .bind(en_name)
        .bind(&image)
        .bind(link)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update organization")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Organization not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete organization")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_organization(row: &sqlx::sqlite::SqliteRow) -> Result<Organization> {
    Ok(Organization {
        id: row.get("id"),
        ar_name: row.get("ar_name"),
        en_name: row.get("en_name"),
        image: row.get("image"),
        link: row.get("link"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
