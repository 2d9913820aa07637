// src/handlers/job.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        assessment::{
            ASSESSMENT_COLUMNS, Assessment, AssessmentSummary, CreateAssessmentRequest,
            validate_questions,
        },
        job::{
            CreateJobRequest, JOB_COLUMNS, JOB_FROM, Job, JobListParams, MAX_REQUIRED_SKILLS,
            UpdateJobRequest,
        },
        skill::SkillRequirement,
    },
    utils::{html::clean_html, jwt::Claims},
};

pub(crate) async fn fetch_job(pool: &PgPool, id: i64) -> Result<Job, AppError> {
    sqlx::query_as::<_, Job>(&format!("SELECT {} {} WHERE j.id = $1", JOB_COLUMNS, JOB_FROM))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Job not found".to_string()))
}

/// Loads a job the calling company must own.
pub(crate) async fn fetch_owned_job(
    pool: &PgPool,
    id: i64,
    claims: &Claims,
) -> Result<Job, AppError> {
    let job = fetch_job(pool, id).await?;
    if job.company_id != claims.user_id()? {
        return Err(AppError::Forbidden("You do not own this job".to_string()));
    }
    Ok(job)
}

pub(crate) async fn fetch_job_assessment(
    pool: &PgPool,
    job_id: i64,
) -> Result<Option<Assessment>, AppError> {
    let assessment = sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {} FROM assessments WHERE job_id = $1",
        ASSESSMENT_COLUMNS
    ))
    .bind(job_id)
    .fetch_optional(pool)
    .await?;
    Ok(assessment)
}

fn check_skill_count(skills: &[SkillRequirement]) -> Result<(), AppError> {
    if skills.len() > MAX_REQUIRED_SKILLS {
        return Err(AppError::BadRequest(format!(
            "A job can list at most {} required skills",
            MAX_REQUIRED_SKILLS
        )));
    }
    Ok(())
}

/// Lists open jobs, newest first.
///
/// Filters: `q` (title keyword), `job_type`, `location` (substring), `remote`.
pub async fn list_jobs(
    State(pool): State<PgPool>,
    Query(params): Query<JobListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
    builder.push(JOB_COLUMNS).push(JOB_FROM).push(" WHERE j.status = 'open'");

    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        builder.push(" AND j.title ILIKE ").push_bind(format!("%{}%", q));
    }
    if let Some(job_type) = params.job_type {
        builder.push(" AND j.job_type = ").push_bind(job_type);
    }
    if let Some(location) = params.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        builder.push(" AND j.location ILIKE ").push_bind(format!("%{}%", location));
    }
    if let Some(remote) = params.remote {
        builder.push(" AND j.is_remote = ").push_bind(remote);
    }

    builder
        .push(" ORDER BY j.created_at DESC, j.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let jobs = builder
        .build_query_as::<Job>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list jobs: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(jobs))
}

/// The calling company's jobs, closed ones included.
pub async fn list_my_jobs(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let jobs = sqlx::query_as::<_, Job>(&format!(
        "SELECT {} {} WHERE j.company_id = $1 ORDER BY j.created_at DESC, j.id DESC",
        JOB_COLUMNS, JOB_FROM
    ))
    .bind(claims.user_id()?)
    .fetch_all(&pool)
    .await?;

    Ok(Json(jobs))
}

/// Job detail plus a summary of its custom assessment, if any.
pub async fn get_job(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let job = fetch_job(&pool, id).await?;
    let assessment = fetch_job_assessment(&pool, id).await?;

    Ok(Json(json!({
        "job": job,
        "assessment": assessment.as_ref().map(AssessmentSummary::from),
    })))
}

/// Posts a new job for the calling company.
pub async fn create_job(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    check_skill_count(&payload.required_skills)?;
    let company_id = claims.user_id()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO jobs
            (company_id, title, description, location, is_remote, job_type, required_skills)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(company_id)
    .bind(payload.title.trim())
    .bind(clean_html(&payload.description))
    .bind(payload.location.trim())
    .bind(payload.is_remote)
    .bind(&payload.job_type)
    .bind(SqlJson(&payload.required_skills))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create job: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(job_id = id, company_id, "Job posted");
    Ok((StatusCode::CREATED, Json(json!({"id": id}))))
}

/// Edits a job. Only present fields change.
pub async fn update_job(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if let Some(skills) = &payload.required_skills {
        check_skill_count(skills)?;
    }
    fetch_owned_job(&pool, id, &claims).await?;

    if payload.is_empty() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE jobs SET updated_at = NOW()");

    if let Some(title) = payload.title {
        builder.push(", title = ").push_bind(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        builder.push(", description = ").push_bind(clean_html(&description));
    }
    if let Some(location) = payload.location {
        builder.push(", location = ").push_bind(location.trim().to_string());
    }
    if let Some(is_remote) = payload.is_remote {
        builder.push(", is_remote = ").push_bind(is_remote);
    }
    if let Some(job_type) = payload.job_type {
        builder.push(", job_type = ").push_bind(job_type);
    }
    if let Some(skills) = payload.required_skills {
        builder.push(", required_skills = ").push_bind(SqlJson(skills));
    }
    if let Some(status) = payload.status {
        builder.push(", status = ").push_bind(status);
    }

    builder.push(" WHERE id = ").push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update job: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(StatusCode::OK)
}

/// Deletes a job with its applications and custom assessment.
pub async fn delete_job(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned_job(&pool, id, &claims).await?;

    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete job: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    tracing::info!(job_id = id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Attaches a custom assessment to a job, or replaces it.
///
/// Job assessments are published immediately. Once anyone has submitted one,
/// its questions are frozen and replacing it is a conflict.
pub async fn put_job_assessment(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<i64>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    validate_questions(&payload.questions)?;
    fetch_owned_job(&pool, job_id, &claims).await?;

    let passing_score = payload.passing_score.unwrap_or(config.default_passing_score);
    let existing = fetch_job_assessment(&pool, job_id).await?;

    let (status, id) = match existing {
        Some(current) => {
            // Submissions hold a shared lock on the row while grading, so
            // taking it here means the check below sees every committed result.
            let mut tx = pool.begin().await?;
            sqlx::query("SELECT id FROM assessments WHERE id = $1 FOR UPDATE")
                .bind(current.id)
                .execute(&mut *tx)
                .await?;

            let replaced = sqlx::query(
                r#"
                UPDATE assessments
                SET title = $1, description = $2, time_limit_minutes = $3,
                    passing_score = $4, questions = $5
                WHERE id = $6
                  AND NOT EXISTS (SELECT 1 FROM assessment_results WHERE assessment_id = $6)
                "#,
            )
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(payload.time_limit_minutes)
            .bind(passing_score)
            .bind(SqlJson(&payload.questions))
            .bind(current.id)
            .execute(&mut *tx)
            .await?;

            if replaced.rows_affected() == 0 {
                return Err(AppError::Conflict(
                    "Assessment already has submissions and cannot be replaced".to_string(),
                ));
            }
            tx.commit().await?;

            (StatusCode::OK, current.id)
        }
        None => {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO assessments
                    (title, description, job_id, time_limit_minutes, passing_score,
                     questions, is_published, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
                RETURNING id
                "#,
            )
            .bind(&payload.title)
            .bind(&payload.description)
            .bind(job_id)
            .bind(payload.time_limit_minutes)
            .bind(passing_score)
            .bind(SqlJson(&payload.questions))
            .bind(claims.user_id()?)
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create job assessment: {:?}", e);
                AppError::from(e)
            })?;

            (StatusCode::CREATED, id)
        }
    };

    tracing::info!(job_id, assessment_id = id, "Job assessment saved");
    Ok((status, Json(json!({"id": id}))))
}
