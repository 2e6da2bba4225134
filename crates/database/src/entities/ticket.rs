//! Complaint ticket entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Baru",
            TicketStatus::InProgress => "Diproses",
            TicketStatus::Resolved => "Selesai",
            TicketStatus::Closed => "Ditutup",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            TicketStatus::Open => "primary",
            TicketStatus::InProgress => "warning",
            TicketStatus::Resolved => "success",
            TicketStatus::Closed => "secondary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn label(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Rendah",
            TicketPriority::Medium => "Sedang",
            TicketPriority::High => "Tinggi",
            TicketPriority::Urgent => "Mendesak",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            TicketPriority::Low => "secondary",
            TicketPriority::Medium => "info",
            TicketPriority::High => "warning",
            TicketPriority::Urgent => "danger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Employment,
    Wages,
    Harassment,
    Membership,
    Other,
}

impl TicketCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TicketCategory::Employment => "Hubungan Kerja",
            TicketCategory::Wages => "Pengupahan",
            TicketCategory::Harassment => "Kekerasan dan Perundungan",
            TicketCategory::Membership => "Keanggotaan",
            TicketCategory::Other => "Lainnya",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub ticket_number: String,
    pub reporter_id: i64,
    pub reporter_name: Option<String>,
    pub assignee_id: Option<i64>,
    pub assignee_name: Option<String>,
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketReply {
    pub id: i64,
    pub ticket_id: i64,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub body: String,
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub reporter_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub status: Option<TicketStatus>,
}
