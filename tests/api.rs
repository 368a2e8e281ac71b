//! HTTP-level API tests
//!
//! Each test boots the full router against an in-memory database and
//! drives it through real requests.

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};

use manara::api::{build_router, AppState};
use manara::cache::create_cache;
use manara::config::{AuthConfig, CacheConfig, UploadConfig};
use manara::db::migrations::run_migrations;
use manara::db::repositories::{
    SqlxOrganizationRepository, SqlxPublicationRepository, SqlxReferenceRepository,
    SqlxReportRepository, SqlxSessionRepository, SqlxUserRepository, SqlxWriterRepository,
};
use manara::db::create_test_pool;
use manara::models::UserRole;
use manara::services::{
    AssetService, OrganizationService, PublicationService, ReferenceService, ReportService,
    UserService, WriterService,
};

struct TestApp {
    server: TestServer,
    admin_token: String,
    user_service: Arc<UserService>,
    upload_dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let pool = create_test_pool().await.unwrap();
    run_migrations(&pool).await.unwrap();

    let upload_dir = tempfile::tempdir().unwrap();
    let cache = create_cache(&CacheConfig::default());

    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let writer_repo = SqlxWriterRepository::boxed(pool.clone());
    let reference_repo = SqlxReferenceRepository::boxed(pool.clone());
    let report_repo = SqlxReportRepository::boxed(pool.clone());

    let user_service = Arc::new(UserService::new(
        user_repo,
        session_repo,
        &AuthConfig::default(),
    ));
    user_service
        .create_user("admin", "correct-horse", UserRole::Admin)
        .await
        .unwrap();

    let state = AppState {
        user_service: user_service.clone(),
        writer_service: Arc::new(WriterService::new(writer_repo.clone(), cache.clone())),
        organization_service: Arc::new(OrganizationService::new(
            SqlxOrganizationRepository::boxed(pool.clone()),
            cache.clone(),
        )),
        reference_service: Arc::new(ReferenceService::new(reference_repo.clone(), cache.clone())),
        report_service: Arc::new(ReportService::new(report_repo.clone(), cache.clone())),
        publication_service: Arc::new(PublicationService::new(
            SqlxPublicationRepository::boxed(pool.clone()),
            writer_repo,
            reference_repo,
            report_repo,
            cache.clone(),
        )),
        asset_service: Arc::new(AssetService::new(UploadConfig {
            path: upload_dir.path().to_path_buf(),
            ..Default::default()
        })),
    };

    let server = TestServer::new(build_router(
        state,
        "http://localhost:5173",
        upload_dir.path(),
    ))
    .unwrap();

    let login: Value = server
        .post("/api/auth/login")
        .json(&json!({"username": "admin", "password": "correct-horse"}))
        .await
        .json();
    let admin_token = login["access_token"].as_str().unwrap().to_string();

    TestApp {
        server,
        admin_token,
        user_service,
        upload_dir,
    }
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({"username": "admin", "password": "wrong"}))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn refresh_rotates_access_token() {
    let app = spawn_app().await;

    let login: Value = app
        .server
        .post("/api/auth/login")
        .json(&json!({"username": "admin", "password": "correct-horse"}))
        .await
        .json();
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let refreshed: Value = app
        .server
        .post("/api/auth/refresh")
        .json(&json!({"refresh_token": refresh_token}))
        .await
        .json();
    let new_access = refreshed["access_token"].as_str().unwrap();
    assert_ne!(new_access, login["access_token"].as_str().unwrap());

    let me = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(new_access)
        .await;
    assert_eq!(me.status_code(), 200);
    let me: Value = me.json();
    assert_eq!(me["username"], "admin");
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let app = spawn_app().await;

    let response = app.server.get("/api/writers").await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .server
        .get("/api/writers")
        .authorization_bearer("bogus-token")
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    let app = spawn_app().await;

    let response = app
        .server
        .get("/api/writers")
        .add_header("cookie", format!("accessToken={}", app.admin_token))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn reference_crud_roundtrip() {
    let app = spawn_app().await;

    let created = app
        .server
        .post("/api/references")
        .authorization_bearer(&app.admin_token)
        .json(&json!({
            "ar_title": "تقرير أممي",
            "en_title": "UN Report",
            "link": "https://example.org/un"
        }))
        .await;
    assert_eq!(created.status_code(), 201);
    let created: Value = created.json();
    let id = created["id"].as_i64().unwrap();

    let updated: Value = app
        .server
        .put(&format!("/api/references/{id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({"en_title": "UN Annual Report"}))
        .await
        .json();
    assert_eq!(updated["en_title"], "UN Annual Report");
    assert_eq!(updated["ar_title"], "تقرير أممي");

    let deleted = app
        .server
        .delete(&format!("/api/references/{id}"))
        .authorization_bearer(&app.admin_token)
        .await;
    assert_eq!(deleted.status_code(), 204);

    // Deleting again is a 404, not a second effect
    let again = app
        .server
        .delete(&format!("/api/references/{id}"))
        .authorization_bearer(&app.admin_token)
        .await;
    assert_eq!(again.status_code(), 404);
}

#[tokio::test]
async fn invalid_create_writes_nothing_and_names_fields() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/references")
        .authorization_bearer(&app.admin_token)
        .json(&json!({"ar_title": "", "en_title": "x", "link": ""}))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["error"]["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"ar_title"));
    assert!(fields.contains(&"link"));

    let list: Value = app
        .server
        .get("/api/references")
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn writer_multipart_create_and_social_link_patch() {
    let app = spawn_app().await;

    let form = MultipartForm::new()
        .add_text("ar_full_name", "سارة الخالد")
        .add_text("en_full_name", "Sara Alkhaled")
        .add_text("en_role", "Editor")
        .add_text(
            "social_links",
            r#"[{"name": "x", "url": "https://x.com/sara"}]"#,
        );
    let created = app
        .server
        .post("/api/writers")
        .authorization_bearer(&app.admin_token)
        .multipart(form)
        .await;
    assert_eq!(created.status_code(), 201);
    let created: Value = created.json();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["social_links"][0]["name"], "x");

    // PATCH replaces the stored list with exactly the submitted list
    let patched: Value = app
        .server
        .patch(&format!("/api/writers/{id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({"social_links": [
            {"name": "linkedin", "url": "https://linkedin.com/in/sara"},
            {"name": "instagram", "url": "https://instagram.com/sara"}
        ]}))
        .await
        .json();
    let links = patched["social_links"].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0]["name"], "linkedin");
}

#[tokio::test]
async fn publication_lifecycle_with_scalar_relation_and_publish_toggle() {
    let app = spawn_app().await;

    let writer_form = MultipartForm::new()
        .add_text("ar_full_name", "كاتب")
        .add_text("en_full_name", "Writer");
    let writer: Value = app
        .server
        .post("/api/writers")
        .authorization_bearer(&app.admin_token)
        .multipart(writer_form)
        .await
        .json();
    let writer_id = writer["id"].as_i64().unwrap();

    let form = MultipartForm::new()
        .add_text("kind", "analysis")
        .add_text("ar_title", "تحليل اقتصادي")
        .add_text("en_title", "Economic Analysis")
        .add_text("ar_description", "النص")
        .add_text("en_description", "Body")
        .add_text("date_of_publish", "2025-07-01")
        .add_text("tags", "economy");
    let created = app
        .server
        .post("/api/publications")
        .authorization_bearer(&app.admin_token)
        .multipart(form)
        .await;
    assert_eq!(created.status_code(), 201);
    let created: Value = created.json();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["publish"], false);

    // Scalar writer_ids deserializes as a one-element list
    let patched: Value = app
        .server
        .patch(&format!("/api/publications/{id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({"writer_ids": writer_id, "time_to_read": 7}))
        .await
        .json();
    assert_eq!(patched["writer_ids"], json!([writer_id]));
    assert_eq!(patched["time_to_read"], 7);
    // Fields not in the payload keep their stored values
    assert_eq!(patched["tags"], json!(["economy"]));

    // Drafts are invisible on the website
    let hidden = app
        .server
        .get(&format!("/api/website/publications/{id}"))
        .await;
    assert_eq!(hidden.status_code(), 404);

    let toggled: Value = app
        .server
        .patch(&format!("/api/publications/{id}/publish"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({"publish": true}))
        .await
        .json();
    assert_eq!(toggled["publish"], true);
    assert_eq!(toggled["en_title"], "Economic Analysis");

    let public: Value = app
        .server
        .get(&format!("/api/website/publications/{id}?lang=en"))
        .await
        .json();
    assert_eq!(public["title"], "Economic Analysis");
    assert_eq!(public["dir"], "ltr");
    assert_eq!(public["lang"], "en");

    let arabic: Value = app
        .server
        .get(&format!("/api/website/publications/{id}"))
        .await
        .json();
    assert_eq!(arabic["title"], "تحليل اقتصادي");
    assert_eq!(arabic["dir"], "rtl");
}

#[tokio::test]
async fn editor_role_is_forbidden_on_admin_routes() {
    let app = spawn_app().await;
    app.user_service
        .create_user("editor", "editor-password", UserRole::Editor)
        .await
        .unwrap();

    let login: Value = app
        .server
        .post("/api/auth/login")
        .json(&json!({"username": "editor", "password": "editor-password"}))
        .await
        .json();
    let token = login["access_token"].as_str().unwrap();

    let response = app
        .server
        .get("/api/writers")
        .authorization_bearer(token)
        .await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // Authentication alone still works for the editor
    let me = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(token)
        .await;
    assert_eq!(me.status_code(), 200);
}

#[tokio::test]
async fn rejected_create_stores_no_file() {
    let app = spawn_app().await;

    // Blank required names alongside a valid image part
    let form = MultipartForm::new()
        .add_text("ar_full_name", "")
        .add_text("en_full_name", "")
        .add_part(
            "image_file",
            Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .file_name("photo.png")
                .mime_type("image/png"),
        );
    let response = app
        .server
        .post("/api/writers")
        .authorization_bearer(&app.admin_token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 400);

    let stored = std::fs::read_dir(app.upload_dir.path())
        .unwrap()
        .count();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn title_filter_is_case_sensitive() {
    let app = spawn_app().await;

    for title in ["Budget Review", "budget notes"] {
        let response = app
            .server
            .post("/api/references")
            .authorization_bearer(&app.admin_token)
            .json(&json!({"ar_title": "عنوان", "en_title": title, "link": "https://e.org"}))
            .await;
        assert_eq!(response.status_code(), 201);
    }

    let list: Value = app
        .server
        .get("/api/references?q=Budget")
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["en_title"], "Budget Review");

    let all: Value = app
        .server
        .get("/api/references")
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert_eq!(all["total"], 2);
}
