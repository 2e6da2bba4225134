//! Complaint tickets: numbering, replies, assignment and the status workflow.

pub mod error;
pub mod service;
pub mod workflow;

pub use error::{TicketError, TicketResult};
pub use service::{ticket_number, ReplyRequest, TicketDetail, TicketQuery, TicketService, TicketView};
pub use workflow::{allowed_transitions, can_transition};
