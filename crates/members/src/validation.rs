use chrono::NaiveDate;
use spk_database::validation::{is_valid_email, is_valid_nik, is_valid_phone};
use spk_database::{MemberFields, ValidationErrors};

/// Normalize free-text fields in place: trim, and turn blanks into `None`.
pub fn normalize_member_fields(fields: &mut MemberFields) {
    fields.full_name = fields.full_name.trim().to_string();
    for value in [
        &mut fields.nik,
        &mut fields.birth_place,
        &mut fields.phone,
        &mut fields.email,
        &mut fields.address,
        &mut fields.regency,
        &mut fields.campus,
        &mut fields.faculty,
        &mut fields.work_unit,
        &mut fields.position,
    ] {
        *value = value
            .take()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }
    if let Some(email) = fields.email.as_mut() {
        *email = email.to_lowercase();
    }
}

/// Shape checks that need no database access.
pub fn validate_member_fields(fields: &MemberFields, today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    errors.required("full_name", &fields.full_name, "Nama lengkap");
    errors.max_len("full_name", &fields.full_name, 150, "Nama lengkap");

    if let Some(nik) = fields.nik.as_deref() {
        if !is_valid_nik(nik) {
            errors.add("nik", "NIK harus terdiri dari 16 digit angka");
        }
    }
    if let Some(phone) = fields.phone.as_deref() {
        if !is_valid_phone(phone) {
            errors.add("phone", "Format nomor HP tidak valid");
        }
    }
    if let Some(email) = fields.email.as_deref() {
        if !is_valid_email(email) {
            errors.add("email", "Format email tidak valid");
        }
    }
    if let Some(birth_date) = fields.birth_date {
        if birth_date >= today {
            errors.add("birth_date", "Tanggal lahir harus sebelum hari ini");
        }
    }
    if let Some(address) = fields.address.as_deref() {
        errors.max_len("address", address, 500, "Alamat");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn blanks_become_none() {
        let mut fields = MemberFields {
            full_name: "  Budi Santoso ".into(),
            nik: Some("   ".into()),
            email: Some(" Budi@Kampus.AC.ID ".into()),
            ..Default::default()
        };
        normalize_member_fields(&mut fields);
        assert_eq!(fields.full_name, "Budi Santoso");
        assert_eq!(fields.nik, None);
        assert_eq!(fields.email.as_deref(), Some("budi@kampus.ac.id"));
    }

    #[test]
    fn reports_each_bad_field() {
        let fields = MemberFields {
            full_name: String::new(),
            nik: Some("12345".into()),
            phone: Some("12345".into()),
            email: Some("budi".into()),
            birth_date: Some(today()),
            ..Default::default()
        };
        let errors = validate_member_fields(&fields, today());
        assert_eq!(errors.get("full_name"), Some("Nama lengkap wajib diisi"));
        assert!(errors.get("nik").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("birth_date").is_some());
    }

    #[test]
    fn accepts_a_valid_profile() {
        let fields = MemberFields {
            full_name: "Budi Santoso".into(),
            nik: Some("3201010101010001".into()),
            phone: Some("0812-3456-7890".into()),
            email: Some("budi@kampus.ac.id".into()),
            birth_date: NaiveDate::from_ymd_opt(1988, 2, 29),
            ..Default::default()
        };
        assert!(validate_member_fields(&fields, today()).is_empty());
    }
}
