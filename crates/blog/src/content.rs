//! Derived values for post bodies.

use once_cell::sync::Lazy;
use regex::Regex;

const WORDS_PER_MINUTE: usize = 200;
pub const EXCERPT_LENGTH: usize = 160;

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Body text with markup removed and whitespace collapsed.
pub fn plain_text(body: &str) -> String {
    TAGS.replace_all(body, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Minutes needed to read `body`, never less than one.
pub fn reading_time_minutes(body: &str) -> usize {
    let words = plain_text(body).split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// The author's excerpt when present, else the start of the body cut at a word boundary.
pub fn excerpt(explicit: Option<&str>, body: &str) -> String {
    if let Some(explicit) = explicit.map(str::trim).filter(|e| !e.is_empty()) {
        return explicit.to_string();
    }

    let text = plain_text(body);
    if text.chars().count() <= EXCERPT_LENGTH {
        return text;
    }
    let cut: String = text.chars().take(EXCERPT_LENGTH).collect();
    let cut = match cut.rfind(' ') {
        Some(space) => &cut[..space],
        None => cut.as_str(),
    };
    format!("{}…", cut.trim_end_matches([',', '.', ';', ':']))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"kata ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"kata ".repeat(201)), 2);
        assert_eq!(reading_time_minutes(&"<p>kata</p> ".repeat(450)), 3);
    }

    #[test]
    fn excerpt_prefers_the_author_text() {
        assert_eq!(excerpt(Some(" Ringkasan "), "<p>Isi</p>"), "Ringkasan");
        assert_eq!(excerpt(Some("  "), "<p>Isi <b>singkat</b></p>"), "Isi singkat");

        let long = format!("<p>{}</p>", "serikat pekerja kampus, ".repeat(20));
        let derived = excerpt(None, &long);
        assert!(derived.ends_with('…'));
        assert!(derived.chars().count() <= EXCERPT_LENGTH + 1);
        assert!(!derived.contains("<p>"));
        assert!(!derived.contains(",…"));
    }
}
