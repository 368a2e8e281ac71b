//! Field validation helpers
//!
//! Mutations are gated by declarative checks; failures carry the
//! offending field names so the API can annotate them individually.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// A single field-level validation failure
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulator for validation failures across a whole payload
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Require a non-empty (after trim) string
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
    }

    /// Parse a `YYYY-MM-DD` date, recording a failure on bad input
    pub fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        if !DATE_RE.is_match(value.trim()) {
            self.push(field, "must be a date in YYYY-MM-DD format");
            return None;
        }
        match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.push(field, "is not a valid calendar date");
                None
            }
        }
    }

    /// Require a value inside an inclusive range
    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.push(field, format!("must be between {min} and {max}"));
        }
    }

    /// Finish validation, returning the collected failures if any
    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_whitespace() {
        let mut v = Validator::new();
        v.require("ar_title", "   ");
        v.require("en_title", "fine");
        let errors = v.finish().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "ar_title");
    }

    #[test]
    fn test_date_format() {
        let mut v = Validator::new();
        assert!(v.date("date_of_publish", "2025-07-01").is_some());
        assert!(v.date("date_of_publish", "01/07/2025").is_none());
        assert!(v.date("date_of_publish", "2025-13-40").is_none());
        let errors = v.finish().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_range() {
        let mut v = Validator::new();
        v.range("time_to_read", 0, 1, 240);
        v.range("time_to_read", 7, 1, 240);
        assert_eq!(v.finish().unwrap_err().len(), 1);
    }
}
