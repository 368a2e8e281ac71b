//! Session repository
//!
//! Sessions are keyed by the opaque access token and also looked up
//! by refresh token when rotating.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::Session;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<()>;
    async fn get_by_access_token(&self, token: &str) -> Result<Option<Session>>;
    async fn get_by_refresh_token(&self, token: &str) -> Result<Option<Session>>;
    /// Swap in a new access token and expiry for an existing session
    async fn rotate_access_token(
        &self,
        refresh_token: &str,
        new_access_token: &str,
        new_expiry: chrono::DateTime<Utc>,
    ) -> Result<()>;
    async fn delete(&self, access_token: &str) -> Result<()>;
    /// Remove sessions whose refresh token has expired
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: SqlitePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (access_token, refresh_token, user_id, access_expires_at, refresh_expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.access_token)
        .bind(&session.refresh_token)
        .bind(session.user_id)
        .bind(session.access_expires_at)
        .bind(session.refresh_expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert session")?;

        Ok(())
    }

    async fn get_by_access_token(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE access_token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get session by access token")?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn get_by_refresh_token(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE refresh_token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get session by refresh token")?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn rotate_access_token(
        &self,
        refresh_token: &str,
        new_access_token: &str,
        new_expiry: chrono::DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE sessions SET access_token = ?, access_expires_at = ? WHERE refresh_token = ?",
        )
        .bind(new_access_token)
        .bind(new_expiry)
        .bind(refresh_token)
        .execute(&self.pool)
        .await
        .context("Failed to rotate access token")?;

        Ok(())
    }

    async fn delete(&self, access_token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE access_token = ?")
            .bind(access_token)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE refresh_expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected())
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    Ok(Session {
        access_token: row.get("access_token"),
        refresh_token: row.get("refresh_token"),
        user_id: row.get("user_id"),
        access_expires_at: row.get("access_expires_at"),
        refresh_expires_at: row.get("refresh_expires_at"),
        created_at: row.get("created_at"),
    })
}
