//! Database repositories
//!
//! Repository pattern implementations for database access. Each
//! repository handles CRUD operations for a specific entity; writes
//! that span a base row and relation rows are transactional.

pub mod organization;
pub mod publication;
pub mod reference;
pub mod report;
pub mod session;
pub mod user;
pub mod writer;

pub use organization::{OrganizationRepository, SqlxOrganizationRepository};
pub use publication::{PublicationFilter, PublicationRepository, SqlxPublicationRepository};
pub use reference::{ReferenceRepository, SqlxReferenceRepository};
pub use report::{ReportFilter, ReportRepository, SqlxReportRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use writer::{SqlxWriterRepository, WriterRepository};
