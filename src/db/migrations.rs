//! Database migrations
//!
//! Code-based migrations embedded in the binary. Each migration has a
//! unique sequential version; applied versions are recorded in the
//! `schema_migrations` table and skipped on subsequent runs.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements
    pub up: &'static str,
}

/// All migrations for the Manara CMS
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users_and_sessions",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'editor',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);

            CREATE TABLE IF NOT EXISTS sessions (
                access_token VARCHAR(64) PRIMARY KEY,
                refresh_token VARCHAR(64) NOT NULL UNIQUE,
                user_id INTEGER NOT NULL,
                access_expires_at TIMESTAMP NOT NULL,
                refresh_expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_refresh ON sessions(refresh_token);
        "#,
    },
    Migration {
        version: 2,
        name: "create_writers",
        up: r#"
            CREATE TABLE IF NOT EXISTS writers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ar_full_name TEXT NOT NULL,
                en_full_name TEXT NOT NULL,
                ar_description TEXT NOT NULL DEFAULT '',
                en_description TEXT NOT NULL DEFAULT '',
                ar_role TEXT NOT NULL DEFAULT '',
                en_role TEXT NOT NULL DEFAULT '',
                image TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS writer_social_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                writer_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (writer_id) REFERENCES writers(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_social_links_writer ON writer_social_links(writer_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_organizations",
        up: r#"
            CREATE TABLE IF NOT EXISTS organizations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ar_name TEXT NOT NULL,
                en_name TEXT NOT NULL,
                image TEXT,
                link TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_references",
        up: r#"
            CREATE TABLE IF NOT EXISTS "references" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ar_title TEXT NOT NULL,
                en_title TEXT NOT NULL,
                link TEXT NOT NULL DEFAULT '',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_reports",
        up: r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ar_title TEXT NOT NULL,
                en_title TEXT NOT NULL,
                ar_description TEXT NOT NULL DEFAULT '',
                en_description TEXT NOT NULL DEFAULT '',
                ar_executive_summary TEXT NOT NULL DEFAULT '',
                en_executive_summary TEXT NOT NULL DEFAULT '',
                ar_note TEXT NOT NULL DEFAULT '',
                en_note TEXT NOT NULL DEFAULT '',
                image TEXT,
                pdf_file TEXT,
                pdf_image TEXT,
                date_of_report DATE NOT NULL,
                date_of_publish DATE NOT NULL,
                publish BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS report_toc_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                report_id INTEGER NOT NULL,
                lang VARCHAR(2) NOT NULL,
                title TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (report_id) REFERENCES reports(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_toc_report ON report_toc_entries(report_id, lang, position);
        "#,
    },
    Migration {
        version: 6,
        name: "create_publications",
        up: r#"
            CREATE TABLE IF NOT EXISTS publications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind VARCHAR(20) NOT NULL DEFAULT 'post',
                ar_title TEXT NOT NULL,
                en_title TEXT NOT NULL,
                ar_description TEXT NOT NULL DEFAULT '',
                en_description TEXT NOT NULL DEFAULT '',
                ar_note TEXT NOT NULL DEFAULT '',
                en_note TEXT NOT NULL DEFAULT '',
                image TEXT,
                time_to_read INTEGER,
                publish BOOLEAN NOT NULL DEFAULT 0,
                date_of_publish DATE NOT NULL,
                report_id INTEGER,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (report_id) REFERENCES reports(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_publications_kind ON publications(kind);
            CREATE INDEX IF NOT EXISTS idx_publications_publish ON publications(publish, date_of_publish);

            CREATE TABLE IF NOT EXISTS publication_gallery (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                publication_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (publication_id) REFERENCES publications(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_gallery_publication ON publication_gallery(publication_id, position);

            CREATE TABLE IF NOT EXISTS publication_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                publication_id INTEGER NOT NULL,
                tag TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (publication_id) REFERENCES publications(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_tags_publication ON publication_tags(publication_id, position);

            CREATE TABLE IF NOT EXISTS publication_writers (
                publication_id INTEGER NOT NULL,
                writer_id INTEGER NOT NULL,
                PRIMARY KEY (publication_id, writer_id),
                FOREIGN KEY (publication_id) REFERENCES publications(id) ON DELETE CASCADE,
                FOREIGN KEY (writer_id) REFERENCES writers(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS publication_references (
                publication_id INTEGER NOT NULL,
                reference_id INTEGER NOT NULL,
                PRIMARY KEY (publication_id, reference_id),
                FOREIGN KEY (publication_id) REFERENCES publications(id) ON DELETE CASCADE,
                FOREIGN KEY (reference_id) REFERENCES "references"(id) ON DELETE CASCADE
            );
        "#,
    },
];

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;

    for migration in MIGRATIONS {
        if applied.contains(&i64::from(migration.version)) {
            continue;
        }

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );

        // Statements within one migration apply atomically
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to apply migration {}", migration.name))?;

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await
            .context("Failed to record migration")?;

        tx.commit().await.context("Failed to commit migration")?;
    }

    Ok(())
}

async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;

    Ok(())
}

async fn applied_versions(pool: &SqlitePool) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT version FROM schema_migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows.iter().map(|r| r.get("version")).collect())
}
