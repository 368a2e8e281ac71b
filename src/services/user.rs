//! User service
//!
//! Login, token refresh, logout, and session validation for the
//! admin surface. Tokens are opaque uuids persisted with the
//! session; the access token expires quickly and is rotated off the
//! longer-lived refresh token.

use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid username or password")]
    AuthenticationError,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service handling authentication and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    access_ttl: ChronoDuration,
    refresh_ttl: ChronoDuration,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            access_ttl: ChronoDuration::seconds(config.access_ttl_seconds as i64),
            refresh_ttl: ChronoDuration::seconds(config.refresh_ttl_seconds as i64),
        }
    }

    /// Create a user with a hashed password
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, UserServiceError> {
        if username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username must not be empty".to_string(),
            ));
        }
        if password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let existing = self
            .user_repo
            .get_by_username(username.trim())
            .await
            .context("Failed to look up username")?;
        if existing.is_some() {
            return Err(UserServiceError::Conflict(format!(
                "Username {username:?} is already taken"
            )));
        }

        let hash = hash_password(password).context("Failed to hash password")?;
        let user = self
            .user_repo
            .create(username.trim(), &hash, role)
            .await
            .context("Failed to create user")?;

        Ok(user)
    }

    /// Whether any user exists yet (used to seed the first admin)
    pub async fn has_users(&self) -> Result<bool, UserServiceError> {
        let count = self.user_repo.count().await.context("Failed to count users")?;
        Ok(count > 0)
    }

    /// Verify credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, UserServiceError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::AuthenticationError)?;

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError);
        }

        let now = Utc::now();
        let session = Session {
            access_token: Uuid::new_v4().simple().to_string(),
            refresh_token: Uuid::new_v4().simple().to_string(),
            user_id: user.id,
            access_expires_at: now + self.access_ttl,
            refresh_expires_at: now + self.refresh_ttl,
            created_at: now,
        };

        self.session_repo
            .create(&session)
            .await
            .context("Failed to persist session")?;

        Ok(session)
    }

    /// Validate an access token and return the associated user.
    ///
    /// Expired access tokens return `None`; the caller is expected to
    /// hit the refresh endpoint.
    pub async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, UserServiceError> {
        let session = self
            .session_repo
            .get_by_access_token(token)
            .await
            .context("Failed to look up session")?;

        let Some(session) = session else {
            return Ok(None);
        };

        if session.access_expired() {
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to look up session user")?;

        Ok(user)
    }

    /// Rotate a fresh access token off a valid refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, UserServiceError> {
        let session = self
            .session_repo
            .get_by_refresh_token(refresh_token)
            .await
            .context("Failed to look up refresh token")?
            .ok_or(UserServiceError::InvalidToken)?;

        if session.refresh_expired() {
            let _ = self.session_repo.delete(&session.access_token).await;
            return Err(UserServiceError::InvalidToken);
        }

        let new_access_token = Uuid::new_v4().simple().to_string();
        let new_expiry = Utc::now() + self.access_ttl;

        self.session_repo
            .rotate_access_token(refresh_token, &new_access_token, new_expiry)
            .await
            .context("Failed to rotate access token")?;

        Ok(Session {
            access_token: new_access_token,
            access_expires_at: new_expiry,
            ..session
        })
    }

    /// Invalidate a session
    pub async fn logout(&self, access_token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(access_token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Remove sessions past their refresh expiry
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to clean up sessions")?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            &AuthConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_conflict() {
        let service = setup().await;
        service
            .create_user("admin", "strong-password", UserRole::Admin)
            .await
            .unwrap();

        let err = service
            .create_user("admin", "another-password", UserRole::Editor)
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_success() {
        let service = setup().await;
        service
            .create_user("admin", "strong-password", UserRole::Admin)
            .await
            .unwrap();

        let session = service.login("admin", "strong-password").await.unwrap();
        assert!(!session.access_token.is_empty());
        assert_ne!(session.access_token, session.refresh_token);

        let user = service
            .validate_access_token(&session.access_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let service = setup().await;
        service
            .create_user("admin", "strong-password", UserRole::Admin)
            .await
            .unwrap();

        assert!(matches!(
            service.login("admin", "wrong").await,
            Err(UserServiceError::AuthenticationError)
        ));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let service = setup().await;
        assert!(matches!(
            service.create_user("admin", "short", UserRole::Admin).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_access_token() {
        let service = setup().await;
        service
            .create_user("admin", "strong-password", UserRole::Admin)
            .await
            .unwrap();
        let session = service.login("admin", "strong-password").await.unwrap();

        let rotated = service.refresh(&session.refresh_token).await.unwrap();
        assert_ne!(rotated.access_token, session.access_token);

        // Old access token no longer resolves
        assert!(service
            .validate_access_token(&session.access_token)
            .await
            .unwrap()
            .is_none());
        // New one does
        assert!(service
            .validate_access_token(&rotated.access_token)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token_fails() {
        let service = setup().await;
        assert!(matches!(
            service.refresh("bogus").await,
            Err(UserServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup().await;
        service
            .create_user("admin", "strong-password", UserRole::Admin)
            .await
            .unwrap();
        let session = service.login("admin", "strong-password").await.unwrap();

        service.logout(&session.access_token).await.unwrap();
        assert!(service
            .validate_access_token(&session.access_token)
            .await
            .unwrap()
            .is_none());
    }
}
