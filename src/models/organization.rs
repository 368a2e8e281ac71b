//! Organization model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partner organization entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier
    pub id: i64,
    /// Name (Arabic)
    pub ar_name: String,
    /// Name (English)
    pub en_name: String,
    /// Logo image URL
    #[serde(default)]
    pub image: Option<String>,
    /// External website link
    pub link: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new organization
#[derive(Debug, Clone, Default)]
pub struct CreateOrganizationInput {
    pub ar_name: String,
    pub en_name: String,
    pub image: Option<String>,
    pub link: String,
}

/// Input for updating an existing organization
#[derive(Debug, Clone, Default)]
pub struct UpdateOrganizationInput {
    pub ar_name: Option<String>,
    pub en_name: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
}
