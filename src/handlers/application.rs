// src/handlers/application.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::job::{fetch_job, fetch_job_assessment},
    models::application::{
        Application, ApplyRequest, MyApplication, UpdateApplicationStatusRequest,
    },
    utils::jwt::Claims,
};

/// Applies the calling student to an open job.
///
/// If the job carries a custom assessment, the student's latest result for it
/// is attached; applying without one is rejected.
pub async fn apply(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<i64>,
    Json(payload): Json<ApplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let student_id = claims.user_id()?;

    let job = fetch_job(&pool, job_id).await?;
    if job.status != "open" {
        return Err(AppError::BadRequest("Job is no longer accepting applications".to_string()));
    }

    let assessment_result_id = match fetch_job_assessment(&pool, job_id).await? {
        None => None,
        Some(assessment) => {
            let result_id: Option<i64> = sqlx::query_scalar(
                r#"
                SELECT id FROM assessment_results
                WHERE assessment_id = $1 AND user_id = $2
                ORDER BY submitted_at DESC
                LIMIT 1
                "#,
            )
            .bind(assessment.id)
            .bind(student_id)
            .fetch_optional(&pool)
            .await?;

            Some(result_id.ok_or(AppError::BadRequest(
                "Complete the job assessment before applying".to_string(),
            ))?)
        }
    };

    let application = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (job_id, student_id, cover_letter, assessment_result_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, job_id, student_id, cover_letter, assessment_result_id, status,
                  created_at, updated_at
        "#,
    )
    .bind(job_id)
    .bind(student_id)
    .bind(&payload.cover_letter)
    .bind(assessment_result_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Already applied to this job".to_string()),
        other => {
            tracing::error!("Failed to create application: {:?}", other);
            other
        }
    })?;

    tracing::info!(application_id = application.id, job_id, student_id, "Application submitted");
    Ok((StatusCode::CREATED, Json(application)))
}

/// The calling student's applications, newest first.
pub async fn list_my_applications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let applications = sqlx::query_as::<_, MyApplication>(
        r#"
        SELECT
            ap.id, ap.job_id, j.title AS job_title,
            COALESCE(c.name, u.username) AS company_name,
            ap.status, r.percentage AS assessment_percentage,
            ap.created_at, ap.updated_at
        FROM applications ap
        JOIN jobs j ON j.id = ap.job_id
        JOIN users u ON u.id = j.company_id
        LEFT JOIN companies c ON c.user_id = j.company_id
        LEFT JOIN assessment_results r ON r.id = ap.assessment_result_id
        WHERE ap.student_id = $1
        ORDER BY ap.created_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(applications))
}

/// Moves an application to a new status. Only the company owning the job may.
pub async fn update_application_status(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateApplicationStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let company_id = claims.user_id()?;

    let owner: i64 = sqlx::query_scalar(
        r#"
        SELECT j.company_id
        FROM applications ap
        JOIN jobs j ON j.id = ap.job_id
        WHERE ap.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Application not found".to_string()))?;

    if owner != company_id {
        return Err(AppError::Forbidden(
            "Application belongs to another company's job".to_string(),
        ));
    }

    let application = sqlx::query_as::<_, Application>(
        r#"
        UPDATE applications SET status = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, job_id, student_id, cover_letter, assessment_result_id, status,
                  created_at, updated_at
        "#,
    )
    .bind(&payload.status)
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update application status: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(application_id = id, status = %application.status, "Application status changed");
    Ok(Json(application))
}
