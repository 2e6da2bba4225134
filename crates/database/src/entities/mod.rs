//! Row entities shared by the repositories and the domain crates

pub mod member;
pub mod organization;
pub mod post;
pub mod role;
pub mod survey;
pub mod ticket;
pub mod user;

pub use member::{
    EducationLevel, EmploymentStatus, Gender, Member, MemberFields, MemberFilter,
    MembershipStatus, Province,
};
pub use organization::{PositionFields, OrgPosition};
pub use post::{Post, PostCategory, PostFields, PostFilter, PostStatus};
pub use role::{CreateRoleRequest, Permission, Role, UpdateRoleRequest};
pub use survey::{QuestionFields, QuestionKind, Survey, SurveyAnswer, SurveyFields, SurveyQuestion};
pub use ticket::{
    CreateTicketRequest, Ticket, TicketCategory, TicketFilter, TicketPriority, TicketReply,
    TicketStatus,
};
pub use user::User;
