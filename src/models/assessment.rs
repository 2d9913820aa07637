// src/models/assessment.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{PublicQuestion, Question, validate_question_set},
    scoring::{ScoreResult, SubmittedAnswer},
};

/// Columns selected for every `Assessment` read.
pub const ASSESSMENT_COLUMNS: &str = r#"
    id, title, description, job_id, time_limit_minutes, passing_score,
    questions, is_published, created_by, created_at
"#;

/// Represents the 'assessments' table.
///
/// `job_id` is `None` for the general skills assessments managed by admins,
/// and set for custom assessments a company attaches to one of its jobs.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assessment {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub job_id: Option<i64>,
    pub time_limit_minutes: i32,
    pub passing_score: i32,

    /// Question bank with answer keys. Frozen once `is_published` is set.
    pub questions: Json<Vec<Question>>,

    pub is_published: bool,
    pub created_by: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Assessment {
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Clamped into the 0-100 range the grader accepts.
    pub fn passing_threshold(&self) -> u32 {
        self.passing_score.clamp(0, 100) as u32
    }
}

/// Assessment as shown to a learner (no answer keys).
#[derive(Debug, Serialize)]
pub struct PublicAssessment {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub job_id: Option<i64>,
    pub time_limit_minutes: i32,
    pub passing_score: i32,
    pub total_points: u32,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Assessment> for PublicAssessment {
    fn from(a: &Assessment) -> Self {
        Self {
            id: a.id,
            title: a.title.clone(),
            description: a.description.clone(),
            job_id: a.job_id,
            time_limit_minutes: a.time_limit_minutes,
            passing_score: a.passing_score,
            total_points: a.total_points(),
            questions: a.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// List entry, without questions.
#[derive(Debug, Serialize)]
pub struct AssessmentSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_minutes: i32,
    pub passing_score: i32,
    pub question_count: usize,
    pub total_points: u32,
}

impl From<&Assessment> for AssessmentSummary {
    fn from(a: &Assessment) -> Self {
        Self {
            id: a.id,
            title: a.title.clone(),
            description: a.description.clone(),
            time_limit_minutes: a.time_limit_minutes,
            passing_score: a.passing_score,
            question_count: a.questions.len(),
            total_points: a.total_points(),
        }
    }
}

/// DTO for creating an assessment (admin general assessment or company job assessment).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 300))]
    pub time_limit_minutes: i32,
    /// Falls back to the configured default when omitted.
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    pub questions: Vec<Question>,
}

/// DTO for editing a draft assessment. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 300))]
    pub time_limit_minutes: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: Option<i32>,
    pub questions: Option<Vec<Question>>,
}

/// Runs per-question field rules and the set-level checks (non-empty, unique ids,
/// answer among the options).
pub fn validate_questions(questions: &[Question]) -> Result<(), AppError> {
    for question in questions {
        question.validate()?;
    }
    validate_question_set(questions)
        .map_err(|e| AppError::BadRequest(format!("Invalid question set: {}", e.code)))
}

/// DTO for submitting an assessment.
#[derive(Debug, Deserialize)]
pub struct SubmitAssessmentRequest {
    pub answers: Vec<SubmittedAnswer>,
    /// When the learner opened the assessment.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// In-progress attempt to close, if the client saved one.
    pub attempt_id: Option<uuid::Uuid>,
}

/// JSON projection of a graded attempt returned by the submit endpoint.
#[derive(Debug, Serialize)]
pub struct SubmitAssessmentResponse {
    pub result_id: i64,
    pub score: u32,
    pub total_possible: u32,
    pub percentage: u32,
    pub passed: bool,
    pub category_scores: std::collections::BTreeMap<crate::models::question::Category, u32>,
    pub per_question: Vec<crate::scoring::QuestionOutcome>,
    pub warnings: Vec<crate::scoring::ScoringWarning>,
    pub time_taken_seconds: i64,
}

impl SubmitAssessmentResponse {
    pub fn new(result_id: i64, result: ScoreResult, time_taken_seconds: i64) -> Self {
        Self {
            result_id,
            score: result.total_score,
            total_possible: result.total_possible,
            percentage: result.percentage,
            passed: result.passed,
            category_scores: result.category_breakdown,
            per_question: result.per_question,
            warnings: result.warnings,
            time_taken_seconds,
        }
    }
}

/// Represents the 'assessment_results' table, joined with the assessment title.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssessmentResultRecord {
    pub id: i64,
    pub assessment_id: i64,
    pub assessment_title: String,
    pub job_id: Option<i64>,
    pub user_id: i64,
    pub total_score: i32,
    pub total_possible: i32,
    pub percentage: i32,
    pub passed: bool,
    pub score_record: Json<ScoreResult>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub time_taken_seconds: Option<i64>,
}
