//! Publication model
//!
//! A publication is the central content item, discriminated by kind
//! (post, analysis, news). It carries bilingual text fields, a hero
//! image plus gallery, free-form tags, a time-to-read estimate, a
//! publish flag, and relations to writers, references, and at most
//! one report.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Publication kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublicationKind {
    /// Regular post (default)
    #[default]
    Post,
    /// Analysis piece
    Analysis,
    /// News item
    News,
}

impl PublicationKind {
    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationKind::Post => "post",
            PublicationKind::Analysis => "analysis",
            PublicationKind::News => "news",
        }
    }

    /// Parse from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "post" => Some(PublicationKind::Post),
            "analysis" => Some(PublicationKind::Analysis),
            "news" => Some(PublicationKind::News),
            _ => None,
        }
    }
}

impl std::fmt::Display for PublicationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Publication entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    /// Unique identifier
    pub id: i64,
    /// Kind discriminator
    pub kind: PublicationKind,
    /// Title (Arabic)
    pub ar_title: String,
    /// Title (English)
    pub en_title: String,
    /// Body/description (Arabic)
    pub ar_description: String,
    /// Body/description (English)
    pub en_description: String,
    /// Note (Arabic)
    #[serde(default)]
    pub ar_note: String,
    /// Note (English)
    #[serde(default)]
    pub en_note: String,
    /// Hero image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Gallery image URLs, in order
    #[serde(default)]
    pub gallery: Vec<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Estimated reading time in minutes
    #[serde(default)]
    pub time_to_read: Option<i64>,
    /// Whether the publication is publicly visible
    pub publish: bool,
    /// Date of publication
    pub date_of_publish: NaiveDate,
    /// Associated writer ids
    #[serde(default)]
    pub writer_ids: Vec<i64>,
    /// Associated reference ids
    #[serde(default)]
    pub reference_ids: Vec<i64>,
    /// Linked report id, if any
    #[serde(default)]
    pub report_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new publication.
///
/// A composite payload: base fields and relation lists land in one
/// transaction, so a created publication is never missing its
/// relations.
#[derive(Debug, Clone)]
pub struct CreatePublicationInput {
    pub kind: PublicationKind,
    pub ar_title: String,
    pub en_title: String,
    pub ar_description: String,
    pub en_description: String,
    pub ar_note: String,
    pub en_note: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub tags: Vec<String>,
    pub time_to_read: Option<i64>,
    pub date_of_publish: NaiveDate,
    pub writer_ids: Vec<i64>,
    pub reference_ids: Vec<i64>,
    pub report_id: Option<i64>,
}

/// Input for updating a publication's base fields
#[derive(Debug, Clone, Default)]
pub struct UpdatePublicationInput {
    pub kind: Option<PublicationKind>,
    pub ar_title: Option<String>,
    pub en_title: Option<String>,
    pub ar_description: Option<String>,
    pub en_description: Option<String>,
    pub ar_note: Option<String>,
    pub en_note: Option<String>,
    pub image: Option<String>,
    /// Replaces the stored gallery when set
    pub gallery: Option<Vec<String>>,
    pub date_of_publish: Option<NaiveDate>,
}

/// Input for replacing a publication's relational data.
///
/// Every list is replace-all: the stored set becomes exactly the
/// submitted set, atomically.
#[derive(Debug, Clone, Default)]
pub struct PublicationRelationsInput {
    pub tags: Option<Vec<String>>,
    pub time_to_read: Option<i64>,
    pub writer_ids: Option<Vec<i64>>,
    pub reference_ids: Option<Vec<i64>>,
    /// `Some(None)` detaches the report; `None` leaves it unchanged
    pub report_id: Option<Option<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            PublicationKind::Post,
            PublicationKind::Analysis,
            PublicationKind::News,
        ] {
            assert_eq!(PublicationKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!(
            PublicationKind::from_str("Analysis"),
            Some(PublicationKind::Analysis)
        );
        assert_eq!(PublicationKind::from_str("bogus"), None);
    }
}
