// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::assessment::fetch_assessment,
    models::{
        assessment::{
            ASSESSMENT_COLUMNS, Assessment, CreateAssessmentRequest, UpdateAssessmentRequest,
            validate_questions,
        },
        user::User,
    },
    utils::jwt::Claims,
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, role, created_at
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Deletes a user by ID, cascading to their profile, jobs and results.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

/// Lists every general assessment, drafts included, with answer keys.
/// Admin only.
pub async fn list_assessments(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let assessments = sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {} FROM assessments WHERE job_id IS NULL ORDER BY id DESC",
        ASSESSMENT_COLUMNS
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(assessments))
}

/// Creates a general skills assessment as an unpublished draft.
/// Admin only.
pub async fn create_assessment(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    validate_questions(&payload.questions)?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO assessments
            (title, description, time_limit_minutes, passing_score, questions, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.time_limit_minutes)
    .bind(payload.passing_score.unwrap_or(config.default_passing_score))
    .bind(SqlJson(&payload.questions))
    .bind(claims.user_id()?)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create assessment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Edits a draft assessment. Published assessments are frozen.
/// Admin only.
pub async fn update_assessment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if let Some(questions) = &payload.questions {
        validate_questions(questions)?;
    }

    let current = fetch_assessment(&pool, id).await?;
    if current.job_id.is_some() {
        return Err(AppError::BadRequest(
            "Job assessments are managed by their company".to_string(),
        ));
    }
    if current.is_published {
        return Err(AppError::Conflict(
            "Published assessments cannot be edited".to_string(),
        ));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE assessments SET ");
    let mut separated = builder.separated(", ");
    let mut changed = false;

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
        changed = true;
    }
    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
        changed = true;
    }
    if let Some(minutes) = payload.time_limit_minutes {
        separated.push("time_limit_minutes = ");
        separated.push_bind_unseparated(minutes);
        changed = true;
    }
    if let Some(passing_score) = payload.passing_score {
        separated.push("passing_score = ");
        separated.push_bind_unseparated(passing_score);
        changed = true;
    }
    if let Some(questions) = payload.questions {
        separated.push("questions = ");
        separated.push_bind_unseparated(SqlJson(questions));
        changed = true;
    }

    if !changed {
        return Ok(StatusCode::OK);
    }

    // Guard against a concurrent publish between the check and the write.
    builder.push(" WHERE is_published = FALSE AND id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update assessment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Published assessments cannot be edited".to_string(),
        ));
    }

    Ok(StatusCode::OK)
}

/// Publishes a draft, freezing its questions.
/// Admin only.
pub async fn publish_assessment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let current = fetch_assessment(&pool, id).await?;
    // Stored drafts were validated on write; re-check before they become gradable.
    validate_questions(&current.questions)?;

    sqlx::query("UPDATE assessments SET is_published = TRUE WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!(assessment_id = id, "Assessment published");
    Ok(StatusCode::OK)
}

/// Deletes an assessment together with its results and attempts.
/// Admin only.
pub async fn delete_assessment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM assessments WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete assessment: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Assessment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
