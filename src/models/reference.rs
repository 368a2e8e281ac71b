//! Reference model
//!
//! A reference is a cited external source (bilingual title + link).
//! Publications point at references through a junction table; the
//! read side exposes the citing publication ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// Unique identifier
    pub id: i64,
    /// Title (Arabic)
    pub ar_title: String,
    /// Title (English)
    pub en_title: String,
    /// Source URL
    pub link: String,
    /// Ids of publications citing this reference
    #[serde(default)]
    pub publication_ids: Vec<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new reference
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReferenceInput {
    pub ar_title: String,
    pub en_title: String,
    pub link: String,
}

/// Input for updating an existing reference
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReferenceInput {
    pub ar_title: Option<String>,
    pub en_title: Option<String>,
    pub link: Option<String>,
}
