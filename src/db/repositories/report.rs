//! Report repository
//!
//! Database operations for reports and their per-language table of
//! contents. Writes touching the TOC run in the same transaction as
//! the base row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{CreateReportInput, Report, SortOrder, UpdateReportInput};

/// Filters applied to report list queries
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Case-sensitive substring match on either-language title
    pub q: Option<String>,
    /// Restrict to a publish state
    pub publish: Option<bool>,
    /// Sort direction by publish date
    pub sort: SortOrder,
}

/// Report repository trait
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, input: &CreateReportInput) -> Result<Report>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Report>>;
    async fn list(&self, offset: i64, limit: i64, filter: &ReportFilter) -> Result<Vec<Report>>;
    async fn count(&self, filter: &ReportFilter) -> Result<i64>;
    async fn update(&self, id: i64, input: &UpdateReportInput) -> Result<Report>;
    /// Flip only the publish flag
    async fn set_publish(&self, id: i64, publish: bool) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn exists(&self, id: i64) -> Result<bool>;
}

/// SQLx-based report repository implementation
pub struct SqlxReportRepository {
    pool: SqlitePool,
}

impl SqlxReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ReportRepository> {
        Arc::new(Self::new(pool))
    }

    async fn attach_toc(&self, report: &mut Report) -> Result<()> {
        let rows = sqlx::query(
            "SELECT lang, title FROM report_toc_entries WHERE report_id = ? ORDER BY position",
        )
        .bind(report.id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch table of contents")?;

        for row in rows {
            let lang: String = row.get("lang");
            let title: String = row.get("title");
            match lang.as_str() {
                "ar" => report.ar_table_of_contents.push(title),
                _ => report.en_table_of_contents.push(title),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReportRepository for SqlxReportRepository {
    async fn create(&self, input: &CreateReportInput) -> Result<Report> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO reports (
                ar_title, en_title, ar_description, en_description,
                ar_executive_summary, en_executive_summary, ar_note, en_note,
                image, pdf_file, pdf_image, date_of_report, date_of_publish,
                publish, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&input.ar_title)
        .bind(&input.en_title)
        .bind(&input.ar_description)
        .bind(&input.en_description)
        .bind(&input.ar_executive_summary)
        .bind(&input.en_executive_summary)
        .bind(&input.ar_note)
        .bind(&input.en_note)
        .bind(&input.image)
        .bind(&input.pdf_file)
        .bind(&input.pdf_image)
        .bind(input.date_of_report)
        .bind(input.date_of_publish)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to insert report")?;

        let id = result.last_insert_rowid();

        insert_toc(&mut tx, id, "ar", &input.ar_table_of_contents).await?;
        insert_toc(&mut tx, id, "en", &input.en_table_of_contents).await?;

        tx.commit().await.context("Failed to commit report create")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Report not found after insert"))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Report>> {
        let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get report by id")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut report = row_to_report(&row)?;
        self.attach_toc(&mut report).await?;
        Ok(Some(report))
    }

    async fn list(&self, offset: i64, limit: i64, filter: &ReportFilter) -> Result<Vec<Report>> {
        // Sort direction cannot be bound as a parameter
        let sql = format!(
            r#"
            SELECT * FROM reports
            WHERE (?1 IS NULL OR instr(ar_title, ?1) > 0 OR instr(en_title, ?1) > 0)
              AND (?2 IS NULL OR publish = ?2)
            ORDER BY date_of_publish {}, id {}
            LIMIT ?3 OFFSET ?4
            "#,
            filter.sort.sql(),
            filter.sort.sql(),
        );

        let rows = sqlx::query(&sql)
            .bind(&filter.q)
            .bind(filter.publish)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list reports")?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let mut report = row_to_report(&row)?;
            self.attach_toc(&mut report).await?;
            reports.push(report);
        }
        Ok(reports)
    }

    async fn count(&self, filter: &ReportFilter) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count FROM reports
            WHERE (?1 IS NULL OR instr(ar_title, ?1) > 0 OR instr(en_title, ?1) > 0)
              AND (?2 IS NULL OR publish = ?2)
            "#,
        )
        .bind(&filter.q)
        .bind(filter.publish)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count reports")?;

        Ok(row.get("count"))
    }

    async fn update(&self, id: i64, input: &UpdateReportInput) -> Result<Report> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Report not found: {id}"))?;

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            UPDATE reports
            SET ar_title = ?, en_title = ?, ar_description = ?, en_description = ?,
                ar_executive_summary = ?, en_executive_summary = ?, ar_note = ?, en_note = ?,
                image = ?, pdf_file = ?, pdf_image = ?, date_of_report = ?, date_of_publish = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.ar_title.as_ref().unwrap_or(&existing.ar_title))
        .bind(input.en_title.as_ref().unwrap_or(&existing.en_title))
        .bind(input.ar_description.as_ref().unwrap_or(&existing.ar_description))
        .bind(input.en_description.as_ref().unwrap_or(&existing.en_description))
        .bind(
            input
                .ar_executive_summary
                .as_ref()
                .unwrap_or(&existing.ar_executive_summary),
        )
        .bind(
            input
                .en_executive_summary
                .as_ref()
                .unwrap_or(&existing.en_executive_summary),
        )
        .bind(input.ar_note.as_ref().unwrap_or(&existing.ar_note))
        .bind(input.en_note.as_ref().unwrap_or(&existing.en_note))
        .bind(input.image.clone().or(existing.image.clone()))
        .bind(input.pdf_file.clone().or(existing.pdf_file.clone()))
        .bind(input.pdf_image.clone().or(existing.pdf_image.clone()))
        .bind(input.date_of_report.unwrap_or(existing.date_of_report))
        .bind(input.date_of_publish.unwrap_or(existing.date_of_publish))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update report")?;

        if let Some(toc) = &input.ar_table_of_contents {
            replace_toc(&mut tx, id, "ar", toc).await?;
        }
        if let Some(toc) = &input.en_table_of_contents {
            replace_toc(&mut tx, id, "en", toc).await?;
        }

        tx.commit().await.context("Failed to commit report update")?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Report not found after update"))
    }

    async fn set_publish(&self, id: i64, publish: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE reports SET publish = ?, updated_at = ? WHERE id = ?")
            .bind(publish)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to set report publish flag")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete report")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM reports WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check report existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }
}

async fn insert_toc(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    report_id: i64,
    lang: &str,
    titles: &[String],
) -> Result<()> {
    for (position, title) in titles.iter().enumerate() {
        sqlx::query(
            "INSERT INTO report_toc_entries (report_id, lang, title, position) VALUES (?, ?, ?, ?)",
        )
        .bind(report_id)
        .bind(lang)
        .bind(title)
        .bind(position as i64)
        .execute(&mut **tx)
        .await
        .context("Failed to insert TOC entry")?;
    }
    Ok(())
}

async fn replace_toc(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    report_id: i64,
    lang: &str,
    titles: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM report_toc_entries WHERE report_id = ? AND lang = ?")
        .bind(report_id)
        .bind(lang)
        .execute(&mut **tx)
        .await
        .context("Failed to clear TOC entries")?;

    insert_toc(tx, report_id, lang, titles).await
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow) -> Result<Report> {
    Ok(Report {
        id: row.get("id"),
        ar_title: row.get("ar_title"),
        en_title: row.get("en_title"),
        ar_description: row.get("ar_description"),
        en_description: row.get("en_description"),
        ar_executive_summary: row.get("ar_executive_summary"),
        en_executive_summary: row.get("en_executive_summary"),
        ar_note: row.get("ar_note"),
        en_note: row.get("en_note"),
        ar_table_of_contents: Vec::new(),
        en_table_of_contents: Vec::new(),
        image: row.get("image"),
        pdf_file: row.get("pdf_file"),
        pdf_image: row.get("pdf_image"),
        date_of_report: row.get("date_of_report"),
        date_of_publish: row.get("date_of_publish"),
        publish: row.get("publish"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
