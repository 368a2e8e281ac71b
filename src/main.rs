//! Manara - a bilingual publishing and content management system

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use manara::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxOrganizationRepository, SqlxPublicationRepository, SqlxReferenceRepository,
            SqlxReportRepository, SqlxSessionRepository, SqlxUserRepository,
            SqlxWriterRepository,
        },
    },
    models::UserRole,
    services::{
        AssetService, OrganizationService, PublicationService, ReferenceService, ReportService,
        UserService, WriterService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manara=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Manara...");

    // Load configuration
    let config = Config::load(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let writer_repo = SqlxWriterRepository::boxed(pool.clone());
    let organization_repo = SqlxOrganizationRepository::boxed(pool.clone());
    let reference_repo = SqlxReferenceRepository::boxed(pool.clone());
    let report_repo = SqlxReportRepository::boxed(pool.clone());
    let publication_repo = SqlxPublicationRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo, session_repo, &config.auth));
    let writer_service = Arc::new(WriterService::new(writer_repo.clone(), cache.clone()));
    let organization_service = Arc::new(OrganizationService::new(
        organization_repo,
        cache.clone(),
    ));
    let reference_service = Arc::new(ReferenceService::new(
        reference_repo.clone(),
        cache.clone(),
    ));
    let report_service = Arc::new(ReportService::new(report_repo.clone(), cache.clone()));
    let publication_service = Arc::new(PublicationService::new(
        publication_repo,
        writer_repo,
        reference_repo,
        report_repo,
        cache.clone(),
    ));
    let asset_service = Arc::new(AssetService::new(config.upload.clone()));

    // Seed the first admin account on an empty user table
    if !user_service.has_users().await? {
        let username =
            std::env::var("MANARA_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password =
            std::env::var("MANARA_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        user_service
            .create_user(&username, &password, UserRole::Admin)
            .await?;
        tracing::warn!("Seeded first admin account {username:?}; change its password");
    }

    // Periodic session cleanup
    {
        let user_service = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Removed {n} expired sessions"),
                    Err(e) => tracing::warn!("Session cleanup failed: {e}"),
                }
            }
        });
    }

    // Build application state
    let state = AppState {
        user_service,
        writer_service,
        organization_service,
        reference_service,
        report_service,
        publication_service,
        asset_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin, &config.upload.path);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
