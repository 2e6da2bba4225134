//! Dashboard aggregates over members, tickets, posts and surveys

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use spk_access::{AccessError, MemberScope, Viewer};
use spk_database::{
    DatabaseError, EducationLevel, EmploymentStatus, Gender, LabeledCount, MemberDimension,
    MemberStatsFilter, MembershipStatus, StatisticsRepository, TicketStatus,
};
use spk_members::dates::month_name;
use spk_surveys::{SurveyError, SurveyService, SurveyView};
use sqlx::SqlitePool;
use std::collections::HashMap;
use thiserror::Error;

const MONTHS_SHOWN: u32 = 12;
const UNFILLED: &str = "Belum diisi";

#[derive(Debug, Error)]
pub enum StatisticsError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Survey(#[from] SurveyError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub key: Option<String>,
    pub label: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub label: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberStatistics {
    pub total: i64,
    pub by_status: Vec<Bucket>,
    pub by_gender: Vec<Bucket>,
    pub by_province: Vec<Bucket>,
    pub by_employment_status: Vec<Bucket>,
    pub by_education_level: Vec<Bucket>,
    pub monthly_registrations: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub scope: MemberScope,
    pub members: MemberStatistics,
    pub tickets_by_status: Vec<Bucket>,
    pub published_posts: i64,
    pub active_surveys: Vec<SurveyView>,
}

#[derive(Clone)]
pub struct StatisticsService {
    repo: StatisticsRepository,
    surveys: SurveyService,
}

impl StatisticsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: StatisticsRepository::new(pool.clone()),
            surveys: SurveyService::new(pool),
        }
    }

    /// Dashboard for `viewer`; member figures are limited to their scope.
    pub async fn dashboard(&self, viewer: &Viewer, now: DateTime<Utc>) -> Result<Dashboard, StatisticsError> {
        viewer.require("stats.view")?;
        let scope = viewer.member_scope();
        self.summary(scope, scope_filter(scope, viewer.user_id), now).await
    }

    /// Aggregates without a permission check, for operator tooling.
    pub async fn summary(
        &self,
        scope: MemberScope,
        filter: MemberStatsFilter,
        now: DateTime<Utc>,
    ) -> Result<Dashboard, StatisticsError> {
        let members = MemberStatistics {
            total: self.repo.member_total(filter).await?,
            by_status: self.dimension(MemberDimension::Status, filter).await?,
            by_gender: self.dimension(MemberDimension::Gender, filter).await?,
            by_province: labeled(self.repo.members_by_province(filter).await?, |name| {
                Some(name.to_string())
            }),
            by_employment_status: self.dimension(MemberDimension::EmploymentStatus, filter).await?,
            by_education_level: self.dimension(MemberDimension::EducationLevel, filter).await?,
            monthly_registrations: self.monthly(now, filter).await?,
        };

        Ok(Dashboard {
            scope,
            members,
            tickets_by_status: labeled(self.repo.tickets_by_status().await?, |key| {
                TicketStatus::ALL
                    .iter()
                    .find(|status| status.as_str() == key)
                    .map(|status| status.label().to_string())
            }),
            published_posts: self.repo.published_posts().await?,
            active_surveys: self.surveys.active(now).await?,
        })
    }

    async fn dimension(
        &self,
        dimension: MemberDimension,
        filter: MemberStatsFilter,
    ) -> Result<Vec<Bucket>, StatisticsError> {
        let rows = self.repo.members_by(dimension, filter).await?;
        Ok(labeled(rows, |key| member_label(dimension, key)))
    }

    async fn monthly(
        &self,
        now: DateTime<Utc>,
        filter: MemberStatsFilter,
    ) -> Result<Vec<MonthlyCount>, StatisticsError> {
        let months = last_months(now.date_naive(), MONTHS_SHOWN);
        let since = months
            .first()
            .and_then(|(year, month)| NaiveDate::from_ymd_opt(*year, *month, 1))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|start| Utc.from_utc_datetime(&start))
            .unwrap_or(now);

        let rows = self.repo.monthly_registrations(since, filter).await?;
        Ok(fill_months(&months, rows))
    }
}

/// `OwnOnly` counts the viewer's own profile and nothing else.
fn scope_filter(scope: MemberScope, user_id: i64) -> MemberStatsFilter {
    match scope {
        MemberScope::All => MemberStatsFilter::default(),
        MemberScope::Province(id) => MemberStatsFilter {
            province_id: Some(id),
            user_id: None,
        },
        MemberScope::OwnOnly => MemberStatsFilter {
            province_id: None,
            user_id: Some(user_id),
        },
    }
}

fn member_label(dimension: MemberDimension, key: &str) -> Option<String> {
    let label = match dimension {
        MemberDimension::Status => key.parse::<MembershipStatus>().ok()?.label(),
        MemberDimension::Gender => [Gender::Male, Gender::Female]
            .iter()
            .find(|gender| gender.as_str() == key)?
            .label(),
        MemberDimension::EmploymentStatus => [
            EmploymentStatus::Permanent,
            EmploymentStatus::Contract,
            EmploymentStatus::Honorary,
            EmploymentStatus::Outsourced,
        ]
        .iter()
        .find(|status| status.as_str() == key)?
        .label(),
        MemberDimension::EducationLevel => [
            EducationLevel::Sma,
            EducationLevel::D3,
            EducationLevel::S1,
            EducationLevel::S2,
            EducationLevel::S3,
        ]
        .iter()
        .find(|level| level.as_str() == key)?
        .label(),
    };
    Some(label.to_string())
}

fn labeled(rows: Vec<LabeledCount>, label: impl Fn(&str) -> Option<String>) -> Vec<Bucket> {
    rows.into_iter()
        .map(|row| {
            let label = row
                .key
                .as_deref()
                .map(|key| label(key).unwrap_or_else(|| key.to_string()))
                .unwrap_or_else(|| UNFILLED.to_string());
            Bucket {
                key: row.key,
                label,
                total: row.total,
            }
        })
        .collect()
}

/// The `count` calendar months ending with the month of `today`, oldest first.
fn last_months(today: NaiveDate, count: u32) -> Vec<(i32, u32)> {
    let (mut year, mut month) = (today.year(), today.month());
    let mut months = Vec::with_capacity(count as usize);
    for _ in 0..count {
        months.push((year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    months.reverse();
    months
}

fn fill_months(months: &[(i32, u32)], rows: Vec<LabeledCount>) -> Vec<MonthlyCount> {
    let totals: HashMap<String, i64> = rows
        .into_iter()
        .filter_map(|row| row.key.map(|key| (key, row.total)))
        .collect();

    months
        .iter()
        .map(|(year, month)| {
            let key = format!("{year}-{month:02}");
            MonthlyCount {
                total: totals.get(&key).copied().unwrap_or(0),
                label: format!("{} {year}", month_name(*month)),
                month: key,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_scopes_never_fall_back_to_everyone() {
        assert_eq!(scope_filter(MemberScope::All, 7), MemberStatsFilter::default());
        assert_eq!(scope_filter(MemberScope::Province(12), 7).province_id, Some(12));
        let own = scope_filter(MemberScope::OwnOnly, 7);
        assert_eq!(own.user_id, Some(7));
        assert_eq!(own.province_id, None);
    }

    #[test]
    fn last_months_crosses_the_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        let months = last_months(today, 4);
        assert_eq!(months, vec![(2025, 11), (2025, 12), (2026, 1), (2026, 2)]);
    }

    #[test]
    fn fill_months_zero_fills_gaps() {
        let months = [(2026, 9), (2026, 10)];
        let rows = vec![LabeledCount {
            key: Some("2026-10".to_string()),
            total: 3,
        }];

        let filled = fill_months(&months, rows);
        assert_eq!(filled[0].total, 0);
        assert_eq!(filled[0].label, "September 2026");
        assert_eq!(filled[1].month, "2026-10");
        assert_eq!(filled[1].total, 3);
    }

    #[test]
    fn buckets_get_indonesian_labels() {
        let rows = vec![
            LabeledCount { key: Some("pending".into()), total: 2 },
            LabeledCount { key: None, total: 1 },
        ];
        let buckets = labeled(rows, |key| member_label(MemberDimension::Status, key));
        assert_eq!(buckets[0].label, MembershipStatus::Pending.label());
        assert_eq!(buckets[1].label, UNFILLED);
    }
}
