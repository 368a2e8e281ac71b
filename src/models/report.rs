//! Report model
//!
//! A report is a bilingual document entity: descriptive fields, an
//! ordered table of contents per language, a cover image, the PDF
//! asset itself, and a separate PDF cover image. Reports carry their
//! own publish flag and can be linked from publications.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Report entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier
    pub id: i64,
    /// Title (Arabic)
    pub ar_title: String,
    /// Title (English)
    pub en_title: String,
    /// Description (Arabic)
    pub ar_description: String,
    /// Description (English)
    pub en_description: String,
    /// Executive summary (Arabic)
    pub ar_executive_summary: String,
    /// Executive summary (English)
    pub en_executive_summary: String,
    /// Note (Arabic)
    #[serde(default)]
    pub ar_note: String,
    /// Note (English)
    #[serde(default)]
    pub en_note: String,
    /// Table of contents (Arabic), in order
    #[serde(default)]
    pub ar_table_of_contents: Vec<String>,
    /// Table of contents (English), in order
    #[serde(default)]
    pub en_table_of_contents: Vec<String>,
    /// Cover image URL
    #[serde(default)]
    pub image: Option<String>,
    /// PDF asset URL
    #[serde(default)]
    pub pdf_file: Option<String>,
    /// PDF cover image URL
    #[serde(default)]
    pub pdf_image: Option<String>,
    /// Date the report covers
    pub date_of_report: NaiveDate,
    /// Date of publication
    pub date_of_publish: NaiveDate,
    /// Whether the report is publicly visible
    pub publish: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new report.
///
/// The table-of-contents lists are part of the composite payload and
/// are written in the same transaction as the base row.
#[derive(Debug, Clone)]
pub struct CreateReportInput {
    pub ar_title: String,
    pub en_title: String,
    pub ar_description: String,
    pub en_description: String,
    pub ar_executive_summary: String,
    pub en_executive_summary: String,
    pub ar_note: String,
    pub en_note: String,
    pub ar_table_of_contents: Vec<String>,
    pub en_table_of_contents: Vec<String>,
    pub image: Option<String>,
    pub pdf_file: Option<String>,
    pub pdf_image: Option<String>,
    pub date_of_report: NaiveDate,
    pub date_of_publish: NaiveDate,
}

/// Input for updating an existing report
#[derive(Debug, Clone, Default)]
pub struct UpdateReportInput {
    pub ar_title: Option<String>,
    pub en_title: Option<String>,
    pub ar_description: Option<String>,
    pub en_description: Option<String>,
    pub ar_executive_summary: Option<String>,
    pub en_executive_summary: Option<String>,
    pub ar_note: Option<String>,
    pub en_note: Option<String>,
    /// Replaces the stored Arabic TOC when set
    pub ar_table_of_contents: Option<Vec<String>>,
    /// Replaces the stored English TOC when set
    pub en_table_of_contents: Option<Vec<String>>,
    pub image: Option<String>,
    pub pdf_file: Option<String>,
    pub pdf_image: Option<String>,
    pub date_of_report: Option<NaiveDate>,
    pub date_of_publish: Option<NaiveDate>,
}
