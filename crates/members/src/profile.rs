//! Derived, display-ready views of a member row.

use chrono::NaiveDate;
use serde::Serialize;
use spk_database::Member;

use crate::dates::{age_on, long_date, long_datetime};

/// Shown when a member has not uploaded a photo.
pub const PLACEHOLDER_PHOTO: &str = "/static/img/avatar-placeholder.png";

/// Fields counted towards profile completion, with their labels.
pub const REQUIRED_FIELDS: [(&str, &str); 16] = [
    ("full_name", "Nama Lengkap"),
    ("nik", "NIK"),
    ("gender", "Jenis Kelamin"),
    ("birth_place", "Tempat Lahir"),
    ("birth_date", "Tanggal Lahir"),
    ("phone", "Nomor HP"),
    ("email", "Email"),
    ("address", "Alamat"),
    ("province_id", "Provinsi"),
    ("regency", "Kabupaten/Kota"),
    ("campus", "Kampus"),
    ("work_unit", "Unit Kerja"),
    ("employment_status", "Status Kepegawaian"),
    ("education_level", "Pendidikan Terakhir"),
    ("photo_path", "Foto"),
    ("id_card_path", "KTP"),
];

#[derive(Debug, Clone)]
pub struct MemberProfile {
    member: Member,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl MemberProfile {
    pub fn new(member: Member) -> Self {
        Self { member }
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn display_name(&self) -> &str {
        self.member.full_name.trim()
    }

    /// Up to two initials, from the first two words of the name.
    pub fn initials(&self) -> String {
        self.display_name()
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn gender_label(&self) -> &'static str {
        self.member.gender.map_or("-", |gender| gender.label())
    }

    pub fn age(&self, today: NaiveDate) -> Option<u32> {
        self.member.birth_date.and_then(|birth| age_on(birth, today))
    }

    pub fn birth_date_label(&self) -> Option<String> {
        self.member.birth_date.map(long_date)
    }

    /// `Bandung, 19 Oktober 1990`
    pub fn birth_place_and_date(&self) -> Option<String> {
        match (self.member.birth_place.as_deref(), self.birth_date_label()) {
            (Some(place), Some(date)) if !place.trim().is_empty() => Some(format!("{}, {date}", place.trim())),
            (_, Some(date)) => Some(date),
            (Some(place), None) if !place.trim().is_empty() => Some(place.trim().to_string()),
            _ => None,
        }
    }

    pub fn joined_label(&self) -> String {
        long_date(self.member.joined_at.date_naive())
    }

    pub fn verified_label(&self) -> Option<String> {
        self.member.verified_at.map(long_datetime)
    }

    pub fn status_label(&self) -> &'static str {
        self.member.status.label()
    }

    pub fn status_badge(&self) -> &'static str {
        self.member.status.badge()
    }

    pub fn employment_label(&self) -> &'static str {
        self.member.employment_status.map_or("-", |status| status.label())
    }

    pub fn education_label(&self) -> &'static str {
        self.member.education_level.map_or("-", |level| level.label())
    }

    fn is_filled(&self, field: &str) -> bool {
        let m = &self.member;
        match field {
            "full_name" => !m.full_name.trim().is_empty(),
            "nik" => filled(&m.nik),
            "gender" => m.gender.is_some(),
            "birth_place" => filled(&m.birth_place),
            "birth_date" => m.birth_date.is_some(),
            "phone" => filled(&m.phone),
            "email" => filled(&m.email),
            "address" => filled(&m.address),
            "province_id" => m.province_id.is_some(),
            "regency" => filled(&m.regency),
            "campus" => filled(&m.campus),
            "work_unit" => filled(&m.work_unit),
            "employment_status" => m.employment_status.is_some(),
            "education_level" => m.education_level.is_some(),
            "photo_path" => filled(&m.photo_path),
            "id_card_path" => filled(&m.id_card_path),
            _ => false,
        }
    }

    /// Share of [`REQUIRED_FIELDS`] filled in, rounded down to a whole percent.
    pub fn completion_percentage(&self) -> u8 {
        let done = REQUIRED_FIELDS
            .iter()
            .filter(|(field, _)| self.is_filled(field))
            .count();
        (done * 100 / REQUIRED_FIELDS.len()) as u8
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .filter(|(field, _)| !self.is_filled(field))
            .map(|(_, label)| *label)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.completion_percentage() == 100
    }

    pub fn photo_url(&self, public_base_url: &str) -> String {
        match self.member.photo_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => public_url(public_base_url, path),
            None => PLACEHOLDER_PHOTO.to_string(),
        }
    }

    pub fn id_card_url(&self, public_base_url: &str) -> Option<String> {
        self.member
            .id_card_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|path| public_url(public_base_url, path))
    }

    pub fn view(&self, today: NaiveDate, public_base_url: &str) -> MemberView {
        MemberView {
            member: self.member.clone(),
            display_name: self.display_name().to_string(),
            initials: self.initials(),
            gender_label: self.gender_label(),
            age: self.age(today),
            birth_place_and_date: self.birth_place_and_date(),
            joined_label: self.joined_label(),
            verified_label: self.verified_label(),
            status_label: self.status_label(),
            status_badge: self.status_badge(),
            employment_label: self.employment_label(),
            education_label: self.education_label(),
            completion: self.completion_percentage(),
            missing_fields: self.missing_fields(),
            photo_url: self.photo_url(public_base_url),
            id_card_url: self.id_card_url(public_base_url),
        }
    }
}

pub fn public_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: Member,
    pub display_name: String,
    pub initials: String,
    pub gender_label: &'static str,
    pub age: Option<u32>,
    pub birth_place_and_date: Option<String>,
    pub joined_label: String,
    pub verified_label: Option<String>,
    pub status_label: &'static str,
    pub status_badge: &'static str,
    pub employment_label: &'static str,
    pub education_label: &'static str,
    pub completion: u8,
    pub missing_fields: Vec<&'static str>,
    pub photo_url: String,
    pub id_card_url: Option<String>,
}
