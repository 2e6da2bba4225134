//! Complaint handling rules.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use spk_access::{AccessService, SqlRoleStore, Viewer};
use spk_database::{
    CreateTicketRequest, DatabaseError, Page, Paged, Ticket, TicketFilter, TicketReply,
    TicketRepository, TicketStatus, ValidationErrors,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{TicketError, TicketResult};
use crate::workflow::{allowed_transitions, can_transition};

/// Allocation attempts before a concurrent number clash is reported.
const NUMBER_ATTEMPTS: u32 = 8;

/// `TKT-YYYYMMDD-XXXX`
pub fn ticket_number(date: NaiveDate, sequence: i64) -> String {
    format!("{}{sequence:04}", ticket_number_prefix(date))
}

fn ticket_number_prefix(date: NaiveDate) -> String {
    format!("TKT-{}-", date.format("%Y%m%d"))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub assigned_to_me: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRequest {
    pub body: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub status_label: &'static str,
    pub status_badge: &'static str,
    pub priority_label: &'static str,
    pub priority_badge: &'static str,
    pub category_label: &'static str,
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self {
            status_label: ticket.status.label(),
            status_badge: ticket.status.badge(),
            priority_label: ticket.priority.label(),
            priority_badge: ticket.priority.badge(),
            category_label: ticket.category.label(),
            ticket,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketView,
    pub replies: Vec<TicketReply>,
    /// Statuses the viewer may move the ticket to.
    pub transitions: Vec<TicketStatus>,
}

#[derive(Clone)]
pub struct TicketService {
    tickets: TicketRepository,
    access: AccessService<SqlRoleStore>,
}

impl TicketService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tickets: TicketRepository::new(pool.clone()),
            access: AccessService::new(pool),
        }
    }

    fn is_staff(viewer: &Viewer) -> bool {
        viewer.can("ticket.reply")
    }

    fn can_see(viewer: &Viewer, ticket: &Ticket) -> bool {
        ticket.reporter_id == viewer.user_id
            || ticket.assignee_id == Some(viewer.user_id)
            || viewer.can("ticket.view")
    }

    async fn load(&self, viewer: &Viewer, id: i64) -> TicketResult<Ticket> {
        let ticket = self
            .tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| TicketError::NotFound(format!("ticket {id}")))?;
        if !Self::can_see(viewer, &ticket) {
            return Err(TicketError::Forbidden("Anda tidak memiliki akses ke pengaduan ini".to_string()));
        }
        Ok(ticket)
    }

    fn transitions_for(viewer: &Viewer, ticket: &Ticket) -> Vec<TicketStatus> {
        let manager = viewer.can("ticket.manage");
        allowed_transitions(ticket.status)
            .iter()
            .copied()
            .filter(|to| manager || (ticket.reporter_id == viewer.user_id && *to == TicketStatus::Closed))
            .collect()
    }

    pub async fn create(&self, viewer: &Viewer, request: CreateTicketRequest) -> TicketResult<TicketView> {
        viewer.require("ticket.create")?;

        let mut errors = ValidationErrors::new();
        errors.required("subject", &request.subject, "Judul pengaduan");
        errors.max_len("subject", request.subject.trim(), 200, "Judul pengaduan");
        errors.required("description", &request.description, "Uraian pengaduan");
        errors.into_result()?;

        let today = Utc::now().date_naive();
        let prefix = ticket_number_prefix(today);
        let mut attempt = 1;
        let ticket = loop {
            let sequence = self.tickets.last_sequence(&prefix).await? + 1;
            let number = ticket_number(today, sequence);
            match self.tickets.create(&number, viewer.user_id, &request).await {
                Err(DatabaseError::Duplicate(_)) if attempt < NUMBER_ATTEMPTS => {
                    debug!(%number, attempt, "ticket number taken concurrently, retrying");
                    attempt += 1;
                }
                result => break result?,
            }
        };
        Ok(ticket.into())
    }

    /// Staff with `ticket.view` see every ticket; everyone else sees their own.
    pub async fn list(&self, viewer: &Viewer, query: &TicketQuery, page: Page) -> TicketResult<Paged<TicketView>> {
        let mut filter = TicketFilter {
            reporter_id: None,
            assignee_id: None,
            status: query.status,
        };
        if query.assigned_to_me {
            filter.assignee_id = Some(viewer.user_id);
        } else if !viewer.can("ticket.view") {
            filter.reporter_id = Some(viewer.user_id);
        }

        let tickets = self.tickets.list(&filter, page).await?;
        Ok(Paged {
            items: tickets.items.into_iter().map(TicketView::from).collect(),
            total: tickets.total,
        })
    }

    /// Internal notes are only included for staff.
    pub async fn get(&self, viewer: &Viewer, id: i64) -> TicketResult<TicketDetail> {
        let ticket = self.load(viewer, id).await?;
        let replies = self.tickets.replies(id, Self::is_staff(viewer)).await?;
        let transitions = Self::transitions_for(viewer, &ticket);
        Ok(TicketDetail {
            ticket: ticket.into(),
            replies,
            transitions,
        })
    }

    pub async fn reply(&self, viewer: &Viewer, id: i64, request: ReplyRequest) -> TicketResult<TicketReply> {
        let ticket = self.load(viewer, id).await?;
        let is_reporter = ticket.reporter_id == viewer.user_id;
        let is_staff = Self::is_staff(viewer);

        if !is_reporter && !is_staff {
            return Err(TicketError::Forbidden("Anda tidak dapat membalas pengaduan ini".to_string()));
        }
        if request.is_internal && !is_staff {
            return Err(TicketError::Forbidden("Catatan internal hanya untuk petugas".to_string()));
        }
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        let mut errors = ValidationErrors::new();
        errors.required("body", &request.body, "Balasan");
        errors.into_result()?;

        let reply = self
            .tickets
            .add_reply(id, viewer.user_id, &request.body, request.is_internal)
            .await?;

        let next = match ticket.status {
            TicketStatus::Open if is_staff && !is_reporter => Some(TicketStatus::InProgress),
            TicketStatus::Resolved if is_reporter && !request.is_internal => Some(TicketStatus::Open),
            _ => None,
        };
        if let Some(status) = next {
            self.tickets.set_status(id, status).await?;
        }
        Ok(reply)
    }

    /// Hands a ticket to a staff member holding `ticket.reply`.
    pub async fn assign(&self, viewer: &Viewer, id: i64, assignee_id: i64) -> TicketResult<TicketView> {
        viewer.require("ticket.assign")?;
        let ticket = self.load(viewer, id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::Closed);
        }

        let assignee = self.access.viewer(assignee_id).await?;
        if !assignee.can("ticket.reply") {
            let mut errors = ValidationErrors::new();
            errors.add("assignee_id", "Petugas tidak memiliki akses untuk menangani pengaduan");
            return Err(errors.into());
        }

        self.tickets.assign(id, assignee_id).await?;
        if ticket.status == TicketStatus::Open {
            self.tickets.set_status(id, TicketStatus::InProgress).await?;
        }
        info!(ticket_id = id, assignee_id, assigned_by = viewer.user_id, "ticket handed over");
        self.reload(id).await
    }

    /// `ticket.manage` moves tickets along the workflow; reporters may only close their own.
    pub async fn change_status(&self, viewer: &Viewer, id: i64, to: TicketStatus) -> TicketResult<TicketView> {
        let ticket = self.load(viewer, id).await?;
        let reporter_closing = ticket.reporter_id == viewer.user_id && to == TicketStatus::Closed;
        if !reporter_closing {
            viewer.require("ticket.manage")?;
        }
        if !can_transition(ticket.status, to) {
            return Err(TicketError::InvalidTransition { from: ticket.status, to });
        }

        self.tickets.set_status(id, to).await?;
        self.reload(id).await
    }

    async fn reload(&self, id: i64) -> TicketResult<TicketView> {
        self.tickets
            .find_by_id(id)
            .await?
            .map(TicketView::from)
            .ok_or_else(|| TicketError::NotFound(format!("ticket {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_carry_the_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(ticket_number(date, 7), "TKT-20261019-0007");
    }
}
