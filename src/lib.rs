//! Manara - a bilingual publishing and content management system
//!
//! Backend for an Arabic/English publishing platform: publications,
//! reports, writers, partner organizations, and cited references,
//! with an authenticated admin API and a public localized website
//! API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
