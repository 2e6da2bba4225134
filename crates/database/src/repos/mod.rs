//! Database repository implementations

pub mod member_repository;
pub mod org_repository;
pub mod post_repository;
pub mod role_repository;
pub mod statistics_repository;
pub mod survey_repository;
pub mod ticket_repository;
pub mod user_repository;

pub use member_repository::MemberRepository;
pub use org_repository::OrgRepository;
pub use post_repository::PostRepository;
pub use role_repository::{PermissionRepository, RoleRepository};
pub use statistics_repository::{LabeledCount, MemberDimension, MemberStatsFilter, StatisticsRepository};
pub use survey_repository::SurveyRepository;
pub use ticket_repository::TicketRepository;
pub use user_repository::UserRepository;
