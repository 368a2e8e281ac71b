//! Data models
//!
//! All data structures used throughout the Manara CMS:
//! - Content entities (Writer, Organization, Reference, Report, Publication)
//! - Auth entities (User, Session)
//! - Pagination and language-selection types shared by every list query

mod common;
mod organization;
mod publication;
mod reference;
mod report;
mod session;
mod user;
mod writer;

pub use common::{one_or_many, one_or_many_opt, Lang, ListParams, PagedResult, SortOrder};
pub use organization::{CreateOrganizationInput, Organization, UpdateOrganizationInput};
pub use publication::{
    CreatePublicationInput, Publication, PublicationKind, PublicationRelationsInput,
    UpdatePublicationInput,
};
pub use reference::{CreateReferenceInput, Reference, UpdateReferenceInput};
pub use report::{CreateReportInput, Report, UpdateReportInput};
pub use session::Session;
pub use user::{CreateUserInput, User, UserRole};
pub use writer::{CreateWriterInput, SocialLink, UpdateWriterInput, Writer};
