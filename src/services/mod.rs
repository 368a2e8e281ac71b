//! Service layer
//!
//! Business logic between the HTTP handlers and the repositories:
//! input validation, cache read-through and invalidation, relation
//! existence checks, and authentication.

pub mod assets;
pub mod organization;
pub mod password;
pub mod publication;
pub mod reference;
pub mod report;
pub mod user;
pub mod validate;
pub mod writer;

pub use assets::{AssetService, AssetServiceError};
pub use organization::{OrganizationService, OrganizationServiceError};
pub use publication::{PublicationService, PublicationServiceError};
pub use reference::{ReferenceService, ReferenceServiceError};
pub use report::{ReportService, ReportServiceError};
pub use user::{UserService, UserServiceError};
pub use validate::FieldError;
pub use writer::{WriterService, WriterServiceError};
