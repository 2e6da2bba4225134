//! Indonesian date formatting.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

pub fn month_name(month: u32) -> &'static str {
    MONTHS[(month.clamp(1, 12) - 1) as usize]
}

/// `19 Oktober 2026`
pub fn long_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), month_name(date.month()), date.year())
}

/// `19 Oktober 2026 14:05`
pub fn long_datetime(value: DateTime<Utc>) -> String {
    format!("{} {}", long_date(value.date_naive()), value.format("%H:%M"))
}

/// Whole years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(birth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_long_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(long_date(date), "19 Oktober 2026");
        let first = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(long_date(first), "5 Januari 2024");

        let at = Utc.with_ymd_and_hms(2026, 5, 1, 14, 5, 0).unwrap();
        assert_eq!(long_datetime(at), "1 Mei 2026 14:05");
    }

    #[test]
    fn age_counts_completed_years() {
        let birth = NaiveDate::from_ymd_opt(1990, 10, 20).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(age_on(birth, today), Some(35));
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()), Some(36));
        assert_eq!(age_on(today, birth), None);
    }
}
