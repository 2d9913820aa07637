// src/handlers/assessment.rs

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::{PgPool, types::Json as SqlJson};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        assessment::{
            ASSESSMENT_COLUMNS, Assessment, AssessmentResultRecord, AssessmentSummary,
            PublicAssessment, SubmitAssessmentRequest, SubmitAssessmentResponse,
        },
        attempt::{AttemptSession, SaveAttemptRequest},
    },
    scoring::{self, SubmittedAnswer},
    utils::jwt::Claims,
};

/// Loads an assessment with its answer keys. 404 if absent.
pub(crate) async fn fetch_assessment(pool: &PgPool, id: i64) -> Result<Assessment, AppError> {
    sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {} FROM assessments WHERE id = $1",
        ASSESSMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Assessment not found".to_string()))
}

async fn fetch_published(pool: &PgPool, id: i64) -> Result<Assessment, AppError> {
    let assessment = fetch_assessment(pool, id).await?;
    if !assessment.is_published {
        return Err(AppError::NotFound("Assessment not found".to_string()));
    }
    Ok(assessment)
}

/// Loads an attempt that must belong to `user_id`.
async fn fetch_own_attempt(pool: &PgPool, id: Uuid, user_id: i64) -> Result<AttemptSession, AppError> {
    let session = AttemptSession::load(pool, id)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;
    if session.user_id != user_id {
        // Do not reveal other users' attempts.
        return Err(AppError::NotFound("Attempt not found".to_string()));
    }
    Ok(session)
}

/// Lists published general skills assessments.
pub async fn list_assessments(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let assessments = sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {} FROM assessments WHERE job_id IS NULL AND is_published ORDER BY created_at DESC",
        ASSESSMENT_COLUMNS
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list assessments: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let summaries: Vec<AssessmentSummary> =
        assessments.iter().map(AssessmentSummary::from).collect();
    Ok(Json(summaries))
}

/// Returns a published assessment without answer keys.
pub async fn get_assessment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = fetch_published(&pool, id).await?;
    Ok(Json(PublicAssessment::from(&assessment)))
}

/// Opens a new attempt session for the caller.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let assessment = fetch_published(&pool, id).await?;

    let session = AttemptSession::start(assessment.id, user_id, Utc::now());
    session.insert(&pool).await?;

    tracing::info!(attempt_id = %session.id, assessment_id = id, user_id, "Attempt started");

    let expires_at =
        session.started_at + Duration::minutes(i64::from(assessment.time_limit_minutes));

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "attempt_id": session.id,
            "started_at": session.started_at,
            "expires_at": expires_at,
            "assessment": PublicAssessment::from(&assessment),
        })),
    ))
}

/// Resumes an attempt: saved answers plus timing.
pub async fn get_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = fetch_own_attempt(&pool, id, claims.user_id()?).await?;
    Ok(Json(session))
}

/// Saves progress on an in-progress attempt.
pub async fn save_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut session = fetch_own_attempt(&pool, id, claims.user_id()?).await?;
    let assessment = fetch_assessment(&pool, session.assessment_id).await?;
    let now = Utc::now();

    if session.is_expired(assessment.time_limit_minutes, now) {
        return Err(AppError::Conflict("Time limit exceeded".to_string()));
    }

    for update in payload.answers {
        session.record_answer(&assessment.questions, &update.question_id, update.raw_answer, now)?;
    }
    session.save(&pool).await?;

    Ok(Json(session))
}

/// Grades a submission and stores it as an immutable result.
///
/// * Answers are matched to questions by id.
/// * With `attempt_id`, saved answers fill in anything the request omits and
///   the attempt's server-side start time is used.
/// * The attempt, if any, is closed in the same transaction as the insert.
pub async fn submit_assessment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    // Both rows stay locked until commit. The shared lock on the assessment
    // keeps its questions fixed while grading; the attempt lock makes a
    // concurrent submit or save wait and then see the final status.
    let mut tx = pool.begin().await?;

    let assessment = sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {} FROM assessments WHERE id = $1 AND is_published FOR SHARE",
        ASSESSMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Assessment not found".to_string()))?;
    let now = Utc::now();

    let mut started_at = req.started_at;
    let mut answers = req.answers;
    let mut session = None;

    if let Some(attempt_id) = req.attempt_id {
        let attempt = AttemptSession::load_for_update(&mut *tx, attempt_id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or(AppError::NotFound("Attempt not found".to_string()))?;
        if attempt.assessment_id != assessment.id {
            return Err(AppError::BadRequest(
                "Attempt belongs to a different assessment".to_string(),
            ));
        }
        if attempt.is_submitted() {
            return Err(AppError::Conflict("Attempt already submitted".to_string()));
        }
        if attempt.is_expired(assessment.time_limit_minutes, now) {
            tracing::warn!(%attempt_id, user_id, "Late submission accepted");
        }

        answers = merge_answers(answers, attempt.to_submitted_answers());
        started_at = attempt.started_at;
        session = Some(attempt);
    }

    if started_at > now {
        return Err(AppError::BadRequest("started_at is in the future".to_string()));
    }

    let result = scoring::grade(&assessment.questions, &answers, assessment.passing_threshold())?;
    for warning in &result.warnings {
        tracing::warn!(assessment_id = id, user_id, ?warning, "Grading data issue");
    }

    let time_taken_seconds = (now - started_at).num_seconds().max(0);

    let result_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO assessment_results
            (assessment_id, user_id, total_score, total_possible, percentage, passed,
             score_record, started_at, submitted_at, time_taken_seconds)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(assessment.id)
    .bind(user_id)
    .bind(to_i32(result.total_score))
    .bind(to_i32(result.total_possible))
    .bind(to_i32(result.percentage))
    .bind(result.passed)
    .bind(SqlJson(&result))
    .bind(started_at)
    .bind(now)
    .bind(time_taken_seconds)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store assessment result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if let Some(mut attempt) = session {
        attempt.close(&mut *tx, now).await?;
    }

    tx.commit().await?;

    tracing::info!(
        result_id,
        assessment_id = id,
        user_id,
        percentage = result.percentage,
        passed = result.passed,
        "Assessment submitted"
    );

    Ok(Json(SubmitAssessmentResponse::new(
        result_id,
        result,
        time_taken_seconds,
    )))
}

/// The caller's result history, newest first.
pub async fn list_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let results = sqlx::query_as::<_, AssessmentResultRecord>(
        r#"
        SELECT
            r.id, r.assessment_id, a.title AS assessment_title, a.job_id, r.user_id,
            r.total_score, r.total_possible, r.percentage, r.passed, r.score_record,
            r.started_at, r.submitted_at, r.time_taken_seconds
        FROM assessment_results r
        JOIN assessments a ON a.id = r.assessment_id
        WHERE r.user_id = $1
        ORDER BY r.submitted_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(results))
}

/// Request answers win; saved answers fill the gaps.
fn merge_answers(request: Vec<SubmittedAnswer>, saved: Vec<SubmittedAnswer>) -> Vec<SubmittedAnswer> {
    let answered: HashSet<String> = request
        .iter()
        .filter_map(|a| a.question_id.clone())
        .collect();

    let mut merged = request;
    merged.extend(saved.into_iter().filter(|a| {
        a.question_id
            .as_ref()
            .is_some_and(|id| !answered.contains(id))
    }));
    merged
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(id: &str, raw: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: Some(id.to_string()),
            raw_answer: Some(raw.to_string()),
        }
    }

    #[test]
    fn merge_prefers_request_answers() {
        let merged = merge_answers(
            vec![answer("q1", "new")],
            vec![answer("q1", "old"), answer("q2", "saved")],
        );
        assert_eq!(merged, vec![answer("q1", "new"), answer("q2", "saved")]);
    }
}
