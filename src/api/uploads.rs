//! Multipart form handling
//!
//! Admin create/update endpoints accept multipart bodies mixing text
//! fields (repeatable) and file parts. The whole body is drained into
//! a `FormData` first so handlers can validate before any asset is
//! stored.

use std::collections::HashMap;

use axum::extract::Multipart;
use chrono::NaiveDate;

use crate::api::middleware::ApiError;

/// A file part pulled out of a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Collected multipart form content
#[derive(Debug, Default)]
pub struct FormData {
    texts: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl FormData {
    /// Drain a multipart body into memory
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::validation_error("Malformed multipart payload"))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::validation_error("Failed to read file part"))?;
                // An empty file input submits a zero-byte part; skip it
                if data.is_empty() {
                    continue;
                }
                form.files.entry(name).or_default().push(UploadedFile {
                    content_type,
                    data: data.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::validation_error("Failed to read text part"))?;
                form.texts.entry(name).or_default().push(value);
            }
        }
        Ok(form)
    }

    /// First value of a text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// First value of a text field, owned, defaulting to empty
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    /// Every value of a repeated text field, in submission order
    pub fn all(&self, name: &str) -> Option<Vec<String>> {
        self.texts.get(name).cloned()
    }

    /// First file submitted under the given field name
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).and_then(|v| v.first())
    }

    /// Every file submitted under the given field name
    pub fn file_list(&self, name: &str) -> &[UploadedFile] {
        self.files.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parse an optional `YYYY-MM-DD` text field
    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, ApiError> {
        match self.text(name) {
            None => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    ApiError::validation_error(format!("{name} must be a YYYY-MM-DD date"))
                }),
        }
    }

    /// Parse a required `YYYY-MM-DD` text field
    pub fn require_date(&self, name: &str) -> Result<NaiveDate, ApiError> {
        self.date(name)?
            .ok_or_else(|| ApiError::validation_error(format!("{name} is required")))
    }

    /// Parse an optional integer text field
    pub fn integer(&self, name: &str) -> Result<Option<i64>, ApiError> {
        match self.text(name) {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ApiError::validation_error(format!("{name} must be an integer"))),
        }
    }

    /// Parse a repeated id field into a list
    pub fn id_list(&self, name: &str) -> Result<Option<Vec<i64>>, ApiError> {
        let Some(values) = self.texts.get(name) else {
            return Ok(None);
        };
        values
            .iter()
            .map(|v| {
                v.trim().parse().map_err(|_| {
                    ApiError::validation_error(format!("{name} entries must be integers"))
                })
            })
            .collect::<Result<Vec<i64>, _>>()
            .map(Some)
    }

    #[cfg(test)]
    fn push_text(&mut self, name: &str, value: &str) {
        self.texts
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_fields_keep_order() {
        let mut form = FormData::default();
        form.push_text("ar_toc", "مقدمة");
        form.push_text("ar_toc", "خاتمة");

        assert_eq!(
            form.all("ar_toc"),
            Some(vec!["مقدمة".to_string(), "خاتمة".to_string()])
        );
        assert_eq!(form.text("ar_toc"), Some("مقدمة"));
    }

    #[test]
    fn test_date_parsing() {
        let mut form = FormData::default();
        form.push_text("date_of_publish", "2025-07-01");
        form.push_text("bad_date", "July 1st");

        assert!(form.date("date_of_publish").unwrap().is_some());
        assert!(form.date("missing").unwrap().is_none());
        assert!(form.date("bad_date").is_err());
        assert!(form.require_date("missing").is_err());
    }

    #[test]
    fn test_id_list_parsing() {
        let mut form = FormData::default();
        form.push_text("writer_ids", "1");
        form.push_text("writer_ids", "2");
        form.push_text("bad_ids", "x");

        assert_eq!(form.id_list("writer_ids").unwrap(), Some(vec![1, 2]));
        assert_eq!(form.id_list("missing").unwrap(), None);
        assert!(form.id_list("bad_ids").is_err());
    }

    #[test]
    fn test_integer_blank_reads_as_none() {
        let mut form = FormData::default();
        form.push_text("time_to_read", "  ");
        assert_eq!(form.integer("time_to_read").unwrap(), None);
    }
}
