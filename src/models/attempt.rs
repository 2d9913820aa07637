// src/models/attempt.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, prelude::FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::Question,
    scoring::SubmittedAnswer,
};

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_SUBMITTED: &str = "submitted";

const ATTEMPT_COLUMNS: &str =
    "id, assessment_id, user_id, answers, status, started_at, updated_at";

/// Extra time allowed past the limit before an attempt counts as expired.
pub const GRACE_PERIOD_SECONDS: i64 = 60;

/// An in-progress assessment attempt.
///
/// Lives in the 'assessment_attempts' table so a learner can resume after a
/// crash or a closed tab. Every write is an explicit call: [`AttemptSession::insert`],
/// [`AttemptSession::save`] or [`AttemptSession::close`].
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AttemptSession {
    pub id: Uuid,
    pub assessment_id: i64,
    pub user_id: i64,
    /// Question id to the latest raw answer (`None` = cleared).
    pub answers: Json<BTreeMap<String, Option<String>>>,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttemptSession {
    pub fn start(assessment_id: i64, user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            assessment_id,
            user_id,
            answers: Json(BTreeMap::new()),
            status: STATUS_IN_PROGRESS.to_string(),
            started_at: now,
            updated_at: now,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == STATUS_SUBMITTED
    }

    pub fn is_expired(&self, time_limit_minutes: i32, now: DateTime<Utc>) -> bool {
        let deadline = self.started_at
            + Duration::minutes(i64::from(time_limit_minutes))
            + Duration::seconds(GRACE_PERIOD_SECONDS);
        now > deadline
    }

    /// Records (or clears) one answer. The question must belong to the bank.
    pub fn record_answer(
        &mut self,
        questions: &[Question],
        question_id: &str,
        raw_answer: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.is_submitted() {
            return Err(AppError::Conflict("Attempt already submitted".to_string()));
        }
        if !questions.iter().any(|q| q.id == question_id) {
            return Err(AppError::BadRequest(format!(
                "Question '{}' is not part of this assessment",
                question_id
            )));
        }
        self.answers.insert(question_id.to_string(), raw_answer);
        self.updated_at = now;
        Ok(())
    }

    /// Answers in the shape the grader takes.
    pub fn to_submitted_answers(&self) -> Vec<SubmittedAnswer> {
        self.answers
            .iter()
            .map(|(id, raw)| SubmittedAnswer {
                question_id: Some(id.clone()),
                raw_answer: raw.clone(),
            })
            .collect()
    }

    pub fn mark_submitted(&mut self, now: DateTime<Utc>) {
        self.status = STATUS_SUBMITTED.to_string();
        self.updated_at = now;
    }

    pub async fn load<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Self>, AppError> {
        let session = sqlx::query_as::<_, AttemptSession>(&format!(
            "SELECT {} FROM assessment_attempts WHERE id = $1",
            ATTEMPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(session)
    }

    /// Like [`AttemptSession::load`], but row-locks the attempt until the
    /// surrounding transaction ends.
    pub async fn load_for_update<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let session = sqlx::query_as::<_, AttemptSession>(&format!(
            "SELECT {} FROM assessment_attempts WHERE id = $1 FOR UPDATE",
            ATTEMPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(session)
    }

    /// Persists a freshly started session.
    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO assessment_attempts
                (id, assessment_id, user_id, answers, status, started_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.id)
        .bind(self.assessment_id)
        .bind(self.user_id)
        .bind(&self.answers)
        .bind(&self.status)
        .bind(self.started_at)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Writes saved answers back. Only an attempt still in progress is
    /// touched; a concurrent submit turns this into a conflict.
    pub async fn save<'e>(&self, executor: impl PgExecutor<'e>) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE assessment_attempts
            SET answers = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(&self.answers)
        .bind(self.updated_at)
        .bind(self.id)
        .bind(STATUS_IN_PROGRESS)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Attempt already submitted".to_string()));
        }
        Ok(())
    }

    /// Marks the attempt submitted, at most once.
    pub async fn close<'e>(
        &mut self,
        executor: impl PgExecutor<'e>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE assessment_attempts
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(STATUS_SUBMITTED)
        .bind(now)
        .bind(self.id)
        .bind(STATUS_IN_PROGRESS)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Attempt already submitted".to_string()));
        }
        self.mark_submitted(now);
        Ok(())
    }
}

/// One answer change in a progress save.
#[derive(Debug, Deserialize, Validate)]
pub struct AnswerUpdate {
    #[validate(length(min = 1, max = 64))]
    pub question_id: String,
    #[validate(length(max = 10000))]
    pub raw_answer: Option<String>,
}

/// DTO for saving attempt progress.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveAttemptRequest {
    #[validate(nested)]
    pub answers: Vec<AnswerUpdate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Category, QuestionType};

    fn bank() -> Vec<Question> {
        ["q1", "q2"]
            .iter()
            .map(|id| Question {
                id: id.to_string(),
                text: "?".to_string(),
                question_type: QuestionType::ShortAnswer,
                options: vec![],
                correct_answer: "yes".to_string(),
                category: Category::ProblemSolving,
                points: 1,
            })
            .collect()
    }

    fn t0() -> DateTime<Utc> {
        "2025-03-01T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn records_answers_and_converts_for_grading() {
        let mut session = AttemptSession::start(1, 2, t0());
        let later = t0() + Duration::minutes(3);

        session
            .record_answer(&bank(), "q2", Some("yes".to_string()), later)
            .unwrap();
        session.record_answer(&bank(), "q1", None, later).unwrap();
        session
            .record_answer(&bank(), "q1", Some("no".to_string()), later)
            .unwrap();

        let answers = session.to_submitted_answers();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_id.as_deref(), Some("q1"));
        assert_eq!(answers[0].raw_answer.as_deref(), Some("no"));
        assert_eq!(session.updated_at, later);
    }

    #[test]
    fn rejects_unknown_questions() {
        let mut session = AttemptSession::start(1, 2, t0());
        assert!(matches!(
            session.record_answer(&bank(), "q9", Some("x".to_string()), t0()),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn submitted_sessions_are_frozen() {
        let mut session = AttemptSession::start(1, 2, t0());
        session.mark_submitted(t0());
        assert!(session.is_submitted());
        assert!(matches!(
            session.record_answer(&bank(), "q1", Some("yes".to_string()), t0()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn expiry_includes_grace_period() {
        let session = AttemptSession::start(1, 2, t0());
        assert!(!session.is_expired(10, t0() + Duration::minutes(10)));
        assert!(!session.is_expired(10, t0() + Duration::seconds(600 + GRACE_PERIOD_SECONDS)));
        assert!(session.is_expired(10, t0() + Duration::seconds(601 + GRACE_PERIOD_SECONDS)));
    }
}
