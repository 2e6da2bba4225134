//! Organizational structure rows

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrgPosition {
    pub id: i64,
    pub title: String,
    pub parent_id: Option<i64>,
    pub member_id: Option<i64>,
    pub member_name: Option<String>,
    pub member_photo: Option<String>,
    pub period: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionFields {
    pub title: String,
    pub parent_id: Option<i64>,
    pub member_id: Option<i64>,
    pub period: String,
    #[serde(default)]
    pub sort_order: i64,
}
