//! Writer model
//!
//! A writer is an author profile with bilingual name, bio, and role
//! fields, a portrait image, and an ordered list of social-media links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Writer entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Writer {
    /// Unique identifier
    pub id: i64,
    /// Full name (Arabic)
    pub ar_full_name: String,
    /// Full name (English)
    pub en_full_name: String,
    /// Biography (Arabic)
    pub ar_description: String,
    /// Biography (English)
    pub en_description: String,
    /// Role/title (Arabic)
    pub ar_role: String,
    /// Role/title (English)
    pub en_role: String,
    /// Portrait image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Social-media links, in display order
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A single social-media link attached to a writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    /// Platform name (instagram, whatsapp, x, linkedin, facebook, ...)
    pub name: String,
    /// Profile URL
    pub url: String,
}

/// Input for creating a new writer
#[derive(Debug, Clone, Default)]
pub struct CreateWriterInput {
    pub ar_full_name: String,
    pub en_full_name: String,
    pub ar_description: String,
    pub en_description: String,
    pub ar_role: String,
    pub en_role: String,
    pub image: Option<String>,
    pub social_links: Vec<SocialLink>,
}

/// Input for updating an existing writer's base fields
#[derive(Debug, Clone, Default)]
pub struct UpdateWriterInput {
    pub ar_full_name: Option<String>,
    pub en_full_name: Option<String>,
    pub ar_description: Option<String>,
    pub en_description: Option<String>,
    pub ar_role: Option<String>,
    pub en_role: Option<String>,
    pub image: Option<String>,
}

impl UpdateWriterInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.ar_full_name.is_some()
            || self.en_full_name.is_some()
            || self.ar_description.is_some()
            || self.en_description.is_some()
            || self.ar_role.is_some()
            || self.en_role.is_some()
            || self.image.is_some()
    }
}
