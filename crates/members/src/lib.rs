//! Member profiles for the SPK platform: derived profile views, typed
//! validation, document uploads and the organization chart.

pub mod dates;
pub mod error;
pub mod organization;
pub mod profile;
pub mod service;
pub mod upload;
pub mod validation;

pub use error::{MemberError, MemberResult};
pub use organization::{build_tree, creates_cycle, OrgNode};
pub use profile::{MemberProfile, MemberView, PLACEHOLDER_PHOTO, REQUIRED_FIELDS};
pub use service::{member_number, MemberQuery, MemberService, OrgChart};
pub use upload::{check_document, check_photo, FileKind, UploadError, UploadSlot, UploadStore};
