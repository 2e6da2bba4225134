//! Aggregating stored answers per question.

use serde::Serialize;
use spk_database::{QuestionKind, SurveyAnswer, SurveyQuestion};

use crate::answers::{MAX_RATING, MIN_RATING};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionCount {
    pub option: String,
    pub count: u64,
    /// Share of respondents who picked this option, 0 to 100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Summary {
    Choices { options: Vec<OptionCount> },
    Rating { average: Option<f64>, distribution: Vec<u64> },
    Text { answers: Vec<String> },
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question: SurveyQuestion,
    /// Stored answer rows; a multiple-choice respondent counts once per option picked.
    pub answered: u64,
    pub summary: Summary,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarizes `answers` for each question. Percentages are relative to
/// `respondents`, so multiple-choice shares may add up to more than 100.
pub fn summarize(questions: &[SurveyQuestion], answers: &[SurveyAnswer], respondents: u64) -> Vec<QuestionResult> {
    questions
        .iter()
        .map(|question| {
            let values: Vec<&str> = answers
                .iter()
                .filter(|a| a.question_id == question.id)
                .map(|a| a.value.as_str())
                .collect();
            summarize_question(question, &values, respondents)
        })
        .collect()
}

fn summarize_question(question: &SurveyQuestion, values: &[&str], respondents: u64) -> QuestionResult {
    let (answered, summary) = match question.kind {
        QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
            let options = question
                .options
                .iter()
                .map(|option| {
                    let count = values.iter().filter(|v| **v == option.as_str()).count() as u64;
                    let percentage = if respondents == 0 {
                        0.0
                    } else {
                        round2(count as f64 * 100.0 / respondents as f64)
                    };
                    OptionCount {
                        option: option.clone(),
                        count,
                        percentage,
                    }
                })
                .collect();
            (values.len() as u64, Summary::Choices { options })
        }
        QuestionKind::Rating => {
            let ratings: Vec<i64> = values
                .iter()
                .filter_map(|v| v.parse::<i64>().ok())
                .filter(|n| (MIN_RATING..=MAX_RATING).contains(n))
                .collect();
            let mut distribution = vec![0u64; (MAX_RATING - MIN_RATING + 1) as usize];
            for rating in &ratings {
                distribution[(rating - MIN_RATING) as usize] += 1;
            }
            let average = (!ratings.is_empty())
                .then(|| round2(ratings.iter().sum::<i64>() as f64 / ratings.len() as f64));
            (ratings.len() as u64, Summary::Rating { average, distribution })
        }
        QuestionKind::Text | QuestionKind::Paragraph => {
            let answers: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            (answers.len() as u64, Summary::Text { answers })
        }
    };

    QuestionResult {
        question: question.clone(),
        answered,
        summary,
    }
}
