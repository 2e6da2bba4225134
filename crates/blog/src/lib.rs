//! News posts for the SPK site: slugs, drafts, publishing and categories.

pub mod content;
pub mod error;
pub mod service;
pub mod slug;

pub use content::{excerpt, plain_text, reading_time_minutes};
pub use error::{BlogError, BlogResult};
pub use service::{BlogService, BulkAction, BulkOutcome, BulkRequest, PostInput, PostQuery, PostView};
pub use slug::{slugify, unique_slug};
