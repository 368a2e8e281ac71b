//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session entity carrying the access and refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque access token (primary key)
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    /// Associated user ID
    pub user_id: i64,
    /// Access-token expiry
    pub access_expires_at: DateTime<Utc>,
    /// Refresh-token expiry
    pub refresh_expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the access token has expired
    pub fn access_expired(&self) -> bool {
        self.access_expires_at < Utc::now()
    }

    /// Check if the refresh token has expired
    pub fn refresh_expired(&self) -> bool {
        self.refresh_expires_at < Utc::now()
    }
}
