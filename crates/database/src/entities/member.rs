//! Member profile entity definitions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Laki-laki",
            Gender::Female => "Perempuan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Active,
    Inactive,
    Rejected,
}

impl MembershipStatus {
    pub const ALL: [MembershipStatus; 4] = [
        MembershipStatus::Pending,
        MembershipStatus::Active,
        MembershipStatus::Inactive,
        MembershipStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "Menunggu Verifikasi",
            MembershipStatus::Active => "Aktif",
            MembershipStatus::Inactive => "Nonaktif",
            MembershipStatus::Rejected => "Ditolak",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "warning",
            MembershipStatus::Active => "success",
            MembershipStatus::Inactive => "secondary",
            MembershipStatus::Rejected => "danger",
        }
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| format!("unknown membership status '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Permanent,
    Contract,
    Honorary,
    Outsourced,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Permanent => "permanent",
            EmploymentStatus::Contract => "contract",
            EmploymentStatus::Honorary => "honorary",
            EmploymentStatus::Outsourced => "outsourced",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmploymentStatus::Permanent => "Pegawai Tetap",
            EmploymentStatus::Contract => "Pegawai Kontrak",
            EmploymentStatus::Honorary => "Honorer",
            EmploymentStatus::Outsourced => "Alih Daya",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Sma,
    D3,
    S1,
    S2,
    S3,
}

impl EducationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Sma => "sma",
            EducationLevel::D3 => "d3",
            EducationLevel::S1 => "s1",
            EducationLevel::S2 => "s2",
            EducationLevel::S3 => "s3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EducationLevel::Sma => "SMA/SMK",
            EducationLevel::D3 => "Diploma (D3)",
            EducationLevel::S1 => "Sarjana (S1)",
            EducationLevel::S2 => "Magister (S2)",
            EducationLevel::S3 => "Doktor (S3)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub user_id: Option<i64>,
    pub member_number: Option<String>,
    pub full_name: String,
    pub nik: Option<String>,
    pub gender: Option<Gender>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub province_id: Option<i64>,
    pub province_name: Option<String>,
    pub regency: Option<String>,
    pub campus: Option<String>,
    pub faculty: Option<String>,
    pub work_unit: Option<String>,
    pub employment_status: Option<EmploymentStatus>,
    pub position: Option<String>,
    pub education_level: Option<EducationLevel>,
    pub status: MembershipStatus,
    pub photo_path: Option<String>,
    pub id_card_path: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable profile fields, used for both creation and full updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberFields {
    pub full_name: String,
    pub nik: Option<String>,
    pub gender: Option<Gender>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub province_id: Option<i64>,
    pub regency: Option<String>,
    pub campus: Option<String>,
    pub faculty: Option<String>,
    pub work_unit: Option<String>,
    pub employment_status: Option<EmploymentStatus>,
    pub position: Option<String>,
    pub education_level: Option<EducationLevel>,
}

#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    pub province_id: Option<i64>,
    pub user_id: Option<i64>,
    pub status: Option<MembershipStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Province {
    pub id: i64,
    pub code: String,
    pub name: String,
}
