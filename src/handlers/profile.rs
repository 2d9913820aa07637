// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        assessment::AssessmentResultRecord,
        profile::{
            AssessmentSnapshot, Company, ProfileResponse, StudentProfile, UpdateCompanyRequest,
            UpdateProfileRequest,
        },
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Loads a student's profile. Shared with the matching handlers.
pub(crate) async fn fetch_student_profile(
    pool: &PgPool,
    user_id: i64,
) -> Result<StudentProfile, AppError> {
    sqlx::query_as::<_, StudentProfile>(
        r#"
        SELECT user_id, full_name, bio, skills, preferred_location, preferred_job_types, updated_at
        FROM student_profiles
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Student profile not found".to_string()))
}

/// Get the current student's profile, skills and latest general assessment.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let (username, email): (String, String) =
        sqlx::query_as("SELECT username, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

    let profile = fetch_student_profile(&pool, user_id).await?;

    let latest = sqlx::query_as::<_, AssessmentResultRecord>(
        r#"
        SELECT
            r.id, r.assessment_id, a.title AS assessment_title, a.job_id, r.user_id,
            r.total_score, r.total_possible, r.percentage, r.passed, r.score_record,
            r.started_at, r.submitted_at, r.time_taken_seconds
        FROM assessment_results r
        JOIN assessments a ON a.id = r.assessment_id
        WHERE r.user_id = $1 AND a.job_id IS NULL
        ORDER BY r.submitted_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    let latest_assessment = latest.map(|r| AssessmentSnapshot {
        assessment_id: r.assessment_id,
        percentage: r.percentage,
        passed: r.passed,
        category_breakdown: r.score_record.0.category_breakdown,
        submitted_at: r.submitted_at,
    });

    Ok(Json(ProfileResponse {
        username,
        email,
        profile,
        latest_assessment,
    }))
}

/// Update the current student's profile. Only present fields change.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("UPDATE student_profiles SET updated_at = NOW()");

    if let Some(full_name) = payload.full_name {
        builder.push(", full_name = ").push_bind(full_name);
    }
    if let Some(bio) = payload.bio {
        builder.push(", bio = ").push_bind(bio);
    }
    if let Some(skills) = payload.skills {
        builder.push(", skills = ").push_bind(SqlJson(skills));
    }
    if let Some(location) = payload.preferred_location {
        // Empty string clears the preference.
        let location = Some(location.trim().to_string()).filter(|l| !l.is_empty());
        builder.push(", preferred_location = ").push_bind(location);
    }
    if let Some(job_types) = payload.preferred_job_types {
        builder.push(", preferred_job_types = ").push_bind(SqlJson(job_types));
    }

    builder.push(" WHERE user_id = ").push_bind(user_id);
    builder.push(
        " RETURNING user_id, full_name, bio, skills, preferred_location, preferred_job_types, updated_at",
    );

    let profile = builder
        .build_query_as::<StudentProfile>()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update profile: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Student profile not found".to_string()))?;

    Ok(Json(profile))
}

/// Get the current company's profile.
pub async fn get_company(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let company = sqlx::query_as::<_, Company>(
        "SELECT user_id, name, website, location, description, updated_at FROM companies WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Company profile not found".to_string()))?;

    Ok(Json(company))
}

/// Update the current company's profile. Descriptions are sanitized.
pub async fn update_company(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("UPDATE companies SET updated_at = NOW()");

    if let Some(name) = payload.name {
        builder.push(", name = ").push_bind(name.trim().to_string());
    }
    if let Some(website) = payload.website {
        builder.push(", website = ").push_bind(website);
    }
    if let Some(location) = payload.location {
        builder.push(", location = ").push_bind(location);
    }
    if let Some(description) = payload.description {
        builder.push(", description = ").push_bind(clean_html(&description));
    }

    builder.push(" WHERE user_id = ").push_bind(user_id);
    builder.push(" RETURNING user_id, name, website, location, description, updated_at");

    let company = builder
        .build_query_as::<Company>()
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Company profile not found".to_string()))?;

    Ok(Json(company))
}
