//! Field-level validation shared by the domain crates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Indonesian mobile numbers: `08…`, `628…` or `+628…`, 10 to 15 digits overall.
static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+62|62|0)8[1-9][0-9]{6,11}$").expect("valid phone regex"));

static NIK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{16}$").expect("valid nik regex"));

/// Validation failures keyed by field name. The first message per field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn required(&mut self, field: &str, value: &str, label: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{label} wajib diisi"));
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize, label: &str) {
        if value.chars().count() > max {
            self.add(field, format!("{label} maksimal {max} karakter"));
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|(field, message)| format!("{field}: {message}")).collect();
        write!(f, "{}", joined.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 255 && EMAIL.is_match(value)
}

/// Accepts spaces and dashes as separators.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    PHONE.is_match(&compact)
}

pub fn is_valid_nik(value: &str) -> bool {
    NIK.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers() {
        assert!(is_valid_phone("081234567890"));
        assert!(is_valid_phone("+62 812-3456-7890"));
        assert!(is_valid_phone("6281234567"));
        assert!(!is_valid_phone("021345678"));
        assert!(!is_valid_phone("08123"));
    }

    #[test]
    fn nik_and_email() {
        assert!(is_valid_nik("3201010101010001"));
        assert!(!is_valid_nik("320101010101000"));
        assert!(!is_valid_nik("32010101010100a1"));
        assert!(is_valid_email("siti@kampus.ac.id"));
        assert!(!is_valid_email("siti@kampus"));
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.required("full_name", " ", "Nama lengkap");
        errors.add("full_name", "second");
        assert_eq!(errors.get("full_name"), Some("Nama lengkap wajib diisi"));
        assert!(errors.clone().into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
