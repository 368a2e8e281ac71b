//! Database layer
//!
//! SQLite persistence for single-binary deployment: pool creation,
//! code-embedded migrations, and repository-pattern data access.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
