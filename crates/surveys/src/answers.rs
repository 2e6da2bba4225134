//! Checking submitted answers against the survey's questions.

use serde::Deserialize;
use spk_database::{QuestionKind, SurveyAnswer, SurveyQuestion, ValidationErrors};
use std::collections::HashMap;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
const MAX_TEXT_LEN: usize = 1_000;
const MAX_PARAGRAPH_LEN: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(i64),
    Text(String),
    Choices(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    pub value: AnswerValue,
}

fn field(question_id: i64) -> String {
    format!("answers.{question_id}")
}

fn values_of(value: &AnswerValue) -> Vec<String> {
    match value {
        AnswerValue::Number(n) => vec![n.to_string()],
        AnswerValue::Text(text) => vec![text.trim().to_string()],
        AnswerValue::Choices(choices) => choices.iter().map(|c| c.trim().to_string()).collect(),
    }
    .into_iter()
    .filter(|v| !v.is_empty())
    .collect()
}

/// Validates `input` and flattens it into stored answer rows, one row per
/// chosen option for multiple-choice questions.
pub fn collect_answers(
    questions: &[SurveyQuestion],
    input: &[AnswerInput],
) -> Result<Vec<SurveyAnswer>, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut by_question: HashMap<i64, &AnswerValue> = HashMap::new();
    for answer in input {
        if !questions.iter().any(|q| q.id == answer.question_id) {
            errors.add(&field(answer.question_id), "Pertanyaan tidak dikenal");
            continue;
        }
        by_question.insert(answer.question_id, &answer.value);
    }

    let mut rows = Vec::new();
    for question in questions {
        let key = field(question.id);
        let mut values = by_question.get(&question.id).map(|v| values_of(v)).unwrap_or_default();

        if values.is_empty() {
            if question.is_required {
                errors.add(&key, "Pertanyaan ini wajib dijawab");
            }
            continue;
        }

        match question.kind {
            QuestionKind::Text | QuestionKind::Paragraph => {
                let limit = if question.kind == QuestionKind::Text {
                    MAX_TEXT_LEN
                } else {
                    MAX_PARAGRAPH_LEN
                };
                if values.len() > 1 {
                    errors.add(&key, "Hanya satu jawaban yang diperbolehkan");
                } else if values[0].chars().count() > limit {
                    errors.add(&key, format!("Jawaban maksimal {limit} karakter"));
                }
            }
            QuestionKind::SingleChoice => {
                if values.len() > 1 {
                    errors.add(&key, "Pilih satu jawaban");
                } else if !question.options.contains(&values[0]) {
                    errors.add(&key, "Pilihan tidak tersedia");
                }
            }
            QuestionKind::MultipleChoice => {
                values.sort();
                values.dedup();
                if values.iter().any(|v| !question.options.contains(v)) {
                    errors.add(&key, "Pilihan tidak tersedia");
                }
            }
            QuestionKind::Rating => {
                let valid = values.len() == 1
                    && values[0]
                        .parse::<i64>()
                        .is_ok_and(|n| (MIN_RATING..=MAX_RATING).contains(&n));
                if !valid {
                    errors.add(&key, format!("Nilai harus antara {MIN_RATING} dan {MAX_RATING}"));
                }
            }
        }

        rows.extend(values.into_iter().map(|value| SurveyAnswer {
            question_id: question.id,
            value,
        }));
    }

    errors.into_result().map(|()| rows)
}

/// Question definitions are checked before a survey is stored.
pub fn validate_question_options(kind: QuestionKind, options: &[String]) -> Option<&'static str> {
    let distinct: std::collections::HashSet<&str> = options.iter().map(|o| o.trim()).collect();
    if kind.has_options() {
        if options.len() < 2 {
            return Some("Pertanyaan pilihan membutuhkan minimal 2 opsi");
        }
        if options.iter().any(|o| o.trim().is_empty()) {
            return Some("Opsi tidak boleh kosong");
        }
        if distinct.len() != options.len() {
            return Some("Opsi tidak boleh sama");
        }
    } else if !options.is_empty() {
        return Some("Jenis pertanyaan ini tidak memiliki opsi");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, kind: QuestionKind, options: &[&str], is_required: bool) -> SurveyQuestion {
        SurveyQuestion {
            id,
            survey_id: 1,
            prompt: format!("Pertanyaan {id}"),
            kind,
            options: options.iter().map(|o| o.to_string()).collect(),
            is_required,
            sort_order: id,
        }
    }

    fn questions() -> Vec<SurveyQuestion> {
        vec![
            question(1, QuestionKind::SingleChoice, &["Ya", "Tidak"], true),
            question(2, QuestionKind::MultipleChoice, &["Upah", "Cuti", "Kontrak"], false),
            question(3, QuestionKind::Rating, &[], true),
            question(4, QuestionKind::Paragraph, &[], false),
        ]
    }

    fn answer(question_id: i64, value: AnswerValue) -> AnswerInput {
        AnswerInput { question_id, value }
    }

    #[test]
    fn flattens_valid_answers() {
        let rows = collect_answers(
            &questions(),
            &[
                answer(1, AnswerValue::Text("Ya".into())),
                answer(2, AnswerValue::Choices(vec!["Upah".into(), "Cuti".into(), "Upah".into()])),
                answer(3, AnswerValue::Number(4)),
            ],
        )
        .unwrap();
        let values: Vec<(i64, &str)> = rows.iter().map(|a| (a.question_id, a.value.as_str())).collect();
        assert_eq!(values, vec![(1, "Ya"), (2, "Cuti"), (2, "Upah"), (3, "4")]);
    }

    #[test]
    fn reports_invalid_answers_per_question() {
        let errors = collect_answers(
            &questions(),
            &[
                answer(2, AnswerValue::Choices(vec!["Gaji".into()])),
                answer(3, AnswerValue::Number(6)),
                answer(9, AnswerValue::Text("?".into())),
            ],
        )
        .unwrap_err();
        assert_eq!(errors.get("answers.1"), Some("Pertanyaan ini wajib dijawab"));
        assert_eq!(errors.get("answers.2"), Some("Pilihan tidak tersedia"));
        assert_eq!(errors.get("answers.3"), Some("Nilai harus antara 1 dan 5"));
        assert_eq!(errors.get("answers.9"), Some("Pertanyaan tidak dikenal"));
        assert_eq!(errors.get("answers.4"), None);
    }

    #[test]
    fn rating_accepts_numeric_strings() {
        let rows = collect_answers(
            &questions()[2..3],
            &[answer(3, AnswerValue::Text(" 5 ".into()))],
        )
        .unwrap();
        assert_eq!(rows[0].value, "5");
    }

    #[test]
    fn question_options_are_checked() {
        let two = vec!["Ya".to_string(), "Tidak".to_string()];
        assert_eq!(validate_question_options(QuestionKind::SingleChoice, &two), None);
        assert!(validate_question_options(QuestionKind::SingleChoice, &two[..1]).is_some());
        assert!(validate_question_options(QuestionKind::Rating, &two).is_some());
        let dup = vec!["Ya".to_string(), "Ya ".to_string()];
        assert_eq!(
            validate_question_options(QuestionKind::MultipleChoice, &dup),
            Some("Opsi tidak boleh sama")
        );
    }
}
