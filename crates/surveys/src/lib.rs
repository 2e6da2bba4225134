//! Surveys: scheduling windows, response collection and result summaries.

pub mod answers;
pub mod error;
pub mod results;
pub mod service;
pub mod status;

pub use answers::{collect_answers, AnswerInput, AnswerValue};
pub use error::{SurveyError, SurveyResult};
pub use results::{summarize, OptionCount, QuestionResult, Summary};
pub use service::{ResponseRequest, SurveyDetail, SurveyResults, SurveyService, SurveyView};
pub use status::{days_remaining, SurveyStatus};
