//! Survey lifecycle derived from the clock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use spk_database::Survey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    Draft,
    Scheduled,
    Active,
    Closed,
}

impl SurveyStatus {
    /// Both window bounds are inclusive. No end date means the survey stays open.
    pub fn at(
        is_published: bool,
        starts_at: DateTime<Utc>,
        ends_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if !is_published {
            SurveyStatus::Draft
        } else if now < starts_at {
            SurveyStatus::Scheduled
        } else if ends_at.is_some_and(|end| now > end) {
            SurveyStatus::Closed
        } else {
            SurveyStatus::Active
        }
    }

    pub fn of(survey: &Survey, now: DateTime<Utc>) -> Self {
        Self::at(survey.is_published, survey.starts_at, survey.ends_at, now)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SurveyStatus::Draft => "Draf",
            SurveyStatus::Scheduled => "Terjadwal",
            SurveyStatus::Active => "Berlangsung",
            SurveyStatus::Closed => "Selesai",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            SurveyStatus::Draft => "secondary",
            SurveyStatus::Scheduled => "info",
            SurveyStatus::Active => "success",
            SurveyStatus::Closed => "dark",
        }
    }

    pub fn accepts_responses(&self) -> bool {
        matches!(self, SurveyStatus::Active)
    }
}

/// Whole days left until `ends_at`, rounded up. `None` when the survey is
/// not running or has no end date.
pub fn days_remaining(survey: &Survey, now: DateTime<Utc>) -> Option<i64> {
    if SurveyStatus::of(survey, now) != SurveyStatus::Active {
        return None;
    }
    let seconds = (survey.ends_at? - now).num_seconds();
    Some((seconds + 86_399) / 86_400)
}
