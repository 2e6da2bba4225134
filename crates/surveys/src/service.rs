use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spk_access::Viewer;
use spk_database::{
    DatabaseError, Page, Paged, Survey, SurveyFields, SurveyQuestion, SurveyRepository,
    ValidationErrors,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::answers::{collect_answers, validate_question_options, AnswerInput};
use crate::error::{SurveyError, SurveyResult};
use crate::results::{summarize, QuestionResult};
use crate::status::{days_remaining, SurveyStatus};

#[derive(Debug, Clone, Serialize)]
pub struct SurveyView {
    #[serde(flatten)]
    pub survey: Survey,
    pub status: SurveyStatus,
    pub status_label: &'static str,
    pub status_badge: &'static str,
    pub days_remaining: Option<i64>,
    pub accepts_responses: bool,
}

impl SurveyView {
    pub fn new(survey: Survey, now: DateTime<Utc>) -> Self {
        let status = SurveyStatus::of(&survey, now);
        Self {
            status,
            status_label: status.label(),
            status_badge: status.badge(),
            days_remaining: days_remaining(&survey, now),
            accepts_responses: status.accepts_responses(),
            survey,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveyDetail {
    #[serde(flatten)]
    pub survey: SurveyView,
    pub questions: Vec<SurveyQuestion>,
    pub has_responded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurveyResults {
    pub survey: SurveyView,
    pub respondents: u64,
    pub questions: Vec<QuestionResult>,
}

fn validate_fields(fields: &SurveyFields) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.required("title", &fields.title, "Judul survei");
    errors.max_len("title", fields.title.trim(), 200, "Judul survei");
    if fields.ends_at.is_some_and(|end| end <= fields.starts_at) {
        errors.add("ends_at", "Tanggal selesai harus setelah tanggal mulai");
    }
    if fields.questions.is_empty() {
        errors.add("questions", "Survei membutuhkan minimal satu pertanyaan");
    }
    for (index, question) in fields.questions.iter().enumerate() {
        let key = format!("questions.{index}");
        errors.required(&key, &question.prompt, "Pertanyaan");
        if let Some(message) = validate_question_options(question.kind, &question.options) {
            errors.add(&key, message);
        }
    }
    errors.into_result()
}

fn trimmed(mut fields: SurveyFields) -> SurveyFields {
    for question in &mut fields.questions {
        question.options = question.options.iter().map(|o| o.trim().to_string()).collect();
    }
    fields.description = fields
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    fields
}

#[derive(Clone)]
pub struct SurveyService {
    surveys: SurveyRepository,
}

impl SurveyService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            surveys: SurveyRepository::new(pool),
        }
    }

    fn is_manager(viewer: &Viewer) -> bool {
        viewer.can("survey.edit") || viewer.can("survey.create")
    }

    async fn load(&self, id: i64) -> SurveyResult<Survey> {
        self.surveys
            .find_by_id(id)
            .await?
            .ok_or_else(|| SurveyError::NotFound(format!("survey {id}")))
    }

    /// Drafts stay hidden from viewers who cannot edit surveys.
    async fn load_visible(&self, viewer: &Viewer, id: i64) -> SurveyResult<Survey> {
        viewer.require("survey.view")?;
        let survey = self.load(id).await?;
        if !survey.is_published && !Self::is_manager(viewer) {
            return Err(SurveyError::NotFound(format!("survey {id}")));
        }
        Ok(survey)
    }

    pub async fn list(&self, viewer: &Viewer, page: Page) -> SurveyResult<Paged<SurveyView>> {
        viewer.require("survey.view")?;
        let surveys = self.surveys.list(!Self::is_manager(viewer), page).await?;
        let now = Utc::now();
        Ok(Paged {
            items: surveys.items.into_iter().map(|s| SurveyView::new(s, now)).collect(),
            total: surveys.total,
        })
    }

    /// Published surveys currently accepting responses.
    pub async fn active(&self, now: DateTime<Utc>) -> SurveyResult<Vec<SurveyView>> {
        Ok(self
            .surveys
            .published()
            .await?
            .into_iter()
            .map(|s| SurveyView::new(s, now))
            .filter(|view| view.accepts_responses)
            .collect())
    }

    pub async fn get(&self, viewer: &Viewer, id: i64) -> SurveyResult<SurveyDetail> {
        let survey = self.load_visible(viewer, id).await?;
        let questions = self.surveys.questions(id).await?;
        let has_responded = self.surveys.has_responded(id, viewer.user_id).await?;
        Ok(SurveyDetail {
            survey: SurveyView::new(survey, Utc::now()),
            questions,
            has_responded,
        })
    }

    pub async fn create(&self, viewer: &Viewer, fields: SurveyFields) -> SurveyResult<SurveyView> {
        viewer.require("survey.create")?;
        let fields = trimmed(fields);
        validate_fields(&fields)?;
        let survey = self.surveys.create(viewer.user_id, &fields).await?;
        Ok(SurveyView::new(survey, Utc::now()))
    }

    /// Editing is refused once a survey has responses, even after it is unpublished again.
    pub async fn update(&self, viewer: &Viewer, id: i64, fields: SurveyFields) -> SurveyResult<SurveyView> {
        viewer.require("survey.edit")?;
        let survey = self.load(id).await?;
        if survey.response_count > 0 {
            return Err(SurveyError::Locked);
        }

        let fields = trimmed(fields);
        validate_fields(&fields)?;
        let survey = self.surveys.update(id, &fields).await?;
        Ok(SurveyView::new(survey, Utc::now()))
    }

    pub async fn set_published(&self, viewer: &Viewer, id: i64, published: bool) -> SurveyResult<SurveyView> {
        viewer.require("survey.publish")?;
        let survey = self.load(id).await?;
        if published && survey.question_count == 0 {
            let mut errors = ValidationErrors::new();
            errors.add("questions", "Survei tanpa pertanyaan tidak dapat diterbitkan");
            return Err(errors.into());
        }
        self.surveys.set_published(id, published).await?;
        info!(survey_id = id, published, user_id = viewer.user_id, "survey publication changed");
        Ok(SurveyView::new(self.load(id).await?, Utc::now()))
    }

    pub async fn delete(&self, viewer: &Viewer, id: i64) -> SurveyResult<()> {
        viewer.require("survey.delete")?;
        if !self.surveys.delete(id).await? {
            return Err(SurveyError::NotFound(format!("survey {id}")));
        }
        Ok(())
    }

    /// One response per user, only while the survey is active.
    pub async fn respond(&self, viewer: &Viewer, id: i64, request: &ResponseRequest) -> SurveyResult<i64> {
        viewer.require("survey.respond")?;
        let survey = self.load_visible(viewer, id).await?;
        let status = SurveyStatus::of(&survey, Utc::now());
        if !status.accepts_responses() {
            return Err(SurveyError::NotAccepting(status));
        }
        if self.surveys.has_responded(id, viewer.user_id).await? {
            return Err(SurveyError::AlreadyResponded);
        }

        let questions = self.surveys.questions(id).await?;
        let rows = collect_answers(&questions, &request.answers)?;
        match self.surveys.insert_response(id, viewer.user_id, &rows).await {
            Ok(response_id) => {
                debug!(survey_id = id, response_id, "survey response recorded");
                Ok(response_id)
            }
            Err(DatabaseError::Duplicate(_)) => Err(SurveyError::AlreadyResponded),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn results(&self, viewer: &Viewer, id: i64) -> SurveyResult<SurveyResults> {
        viewer.require("survey.results")?;
        let survey = self.load(id).await?;
        let questions = self.surveys.questions(id).await?;
        let answers = self.surveys.answers(id).await?;
        let respondents = survey.response_count.max(0) as u64;
        Ok(SurveyResults {
            questions: summarize(&questions, &answers, respondents),
            respondents,
            survey: SurveyView::new(survey, Utc::now()),
        })
    }
}
