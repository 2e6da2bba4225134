//! Survey, question and response repository

use crate::entities::{QuestionFields, QuestionKind, Survey, SurveyAnswer, SurveyFields, SurveyQuestion};
use crate::types::{DatabaseError, DatabaseResult, Page, Paged};
use chrono::Utc;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::info;

const SURVEY_SELECT: &str = "SELECT s.id, s.title, s.description, s.starts_at, s.ends_at, s.is_published, \
     s.created_by, (SELECT COUNT(*) FROM survey_questions q WHERE q.survey_id = s.id) AS question_count, \
     (SELECT COUNT(*) FROM survey_responses r WHERE r.survey_id = s.id) AS response_count, \
     s.created_at, s.updated_at FROM surveys s";

#[derive(Clone)]
pub struct SurveyRepository {
    pool: SqlitePool,
}

impl SurveyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, published_only: bool, page: Page) -> DatabaseResult<Paged<Survey>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM surveys WHERE (? = 0 OR is_published = 1)")
            .bind(published_only)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Survey>(&format!(
            "{SURVEY_SELECT} WHERE (? = 0 OR s.is_published = 1) ORDER BY s.starts_at DESC, s.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(published_only)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paged { items, total })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Survey>> {
        let survey = sqlx::query_as::<_, Survey>(&format!("{SURVEY_SELECT} WHERE s.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(survey)
    }

    /// Every published survey. Status is derived by the caller from the window.
    pub async fn published(&self) -> DatabaseResult<Vec<Survey>> {
        let surveys = sqlx::query_as::<_, Survey>(&format!(
            "{SURVEY_SELECT} WHERE s.is_published = 1 ORDER BY s.starts_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(surveys)
    }

    pub async fn create(&self, created_by: i64, fields: &SurveyFields) -> DatabaseResult<Survey> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO surveys (title, description, starts_at, ends_at, is_published, created_by, created_at, updated_at) \
             VALUES (?, ?, ?, ?, 0, ?, ?, ?)",
        )
        .bind(fields.title.trim())
        .bind(&fields.description)
        .bind(fields.starts_at)
        .bind(fields.ends_at)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        insert_questions(&mut tx, id, &fields.questions).await?;
        tx.commit().await?;

        info!(survey_id = id, questions = fields.questions.len(), "survey created");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("survey {id}")))
    }

    /// Rewrites the survey header and replaces its questions.
    pub async fn update(&self, id: i64, fields: &SurveyFields) -> DatabaseResult<Survey> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE surveys SET title = ?, description = ?, starts_at = ?, ends_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(fields.title.trim())
        .bind(&fields.description)
        .bind(fields.starts_at)
        .bind(fields.ends_at)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("survey {id}")));
        }

        sqlx::query("DELETE FROM survey_questions WHERE survey_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_questions(&mut tx, id, &fields.questions).await?;
        tx.commit().await?;

        info!(survey_id = id, "survey updated");
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("survey {id}")))
    }

    pub async fn set_published(&self, id: i64, published: bool) -> DatabaseResult<()> {
        sqlx::query("UPDATE surveys SET is_published = ?, updated_at = ? WHERE id = ?")
            .bind(published)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(survey_id = id, published, "survey publish flag changed");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM surveys WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!(survey_id = id, "survey deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn questions(&self, survey_id: i64) -> DatabaseResult<Vec<SurveyQuestion>> {
        let rows = sqlx::query(
            "SELECT id, survey_id, prompt, kind, options, is_required, sort_order \
             FROM survey_questions WHERE survey_id = ? ORDER BY sort_order, id",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> DatabaseResult<SurveyQuestion> {
                let options: String = row.try_get("options")?;
                Ok(SurveyQuestion {
                    id: row.try_get("id")?,
                    survey_id: row.try_get("survey_id")?,
                    prompt: row.try_get("prompt")?,
                    kind: row.try_get::<QuestionKind, _>("kind")?,
                    options: serde_json::from_str(&options)?,
                    is_required: row.try_get("is_required")?,
                    sort_order: row.try_get("sort_order")?,
                })
            })
            .collect()
    }

    pub async fn has_responded(&self, survey_id: i64, user_id: i64) -> DatabaseResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM survey_responses WHERE survey_id = ? AND user_id = ?",
        )
        .bind(survey_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Stores a response with its answers. A second response by the same user
    /// fails with [`DatabaseError::Duplicate`].
    pub async fn insert_response(
        &self,
        survey_id: i64,
        user_id: i64,
        answers: &[SurveyAnswer],
    ) -> DatabaseResult<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO survey_responses (survey_id, user_id, submitted_at) VALUES (?, ?, ?)",
        )
        .bind(survey_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        let response_id = result.last_insert_rowid();

        for answer in answers {
            sqlx::query("INSERT INTO survey_answers (response_id, question_id, value) VALUES (?, ?, ?)")
                .bind(response_id)
                .bind(answer.question_id)
                .bind(&answer.value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(survey_id, user_id, response_id, answers = answers.len(), "survey response stored");
        Ok(response_id)
    }

    pub async fn answers(&self, survey_id: i64) -> DatabaseResult<Vec<SurveyAnswer>> {
        let answers = sqlx::query_as::<_, SurveyAnswer>(
            "SELECT a.question_id, a.value FROM survey_answers a \
             JOIN survey_responses r ON r.id = a.response_id \
             WHERE r.survey_id = ? ORDER BY a.id",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }
}

async fn insert_questions(
    tx: &mut Transaction<'_, Sqlite>,
    survey_id: i64,
    questions: &[QuestionFields],
) -> DatabaseResult<()> {
    for (index, question) in questions.iter().enumerate() {
        let options = serde_json::to_string(&question.options)?;
        sqlx::query(
            "INSERT INTO survey_questions (survey_id, prompt, kind, options, is_required, sort_order) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(survey_id)
        .bind(question.prompt.trim())
        .bind(question.kind)
        .bind(options)
        .bind(question.is_required)
        .bind(index as i64)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
