// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, Role, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a student or company account.
///
/// Creates the user row and its empty profile (student profile or company
/// record) in one transaction. Returns 201 Created and the user object
/// (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.role == Role::Admin {
        return Err(AppError::BadRequest(
            "Only student or company accounts can register".to_string(),
        ));
    }
    let company_name = match (payload.role, payload.company_name.as_deref()) {
        (Role::Company, None) => {
            return Err(AppError::BadRequest(
                "company_name is required for company accounts".to_string(),
            ));
        }
        (Role::Company, Some(name)) => Some(name.trim().to_string()),
        _ => None,
    };

    let hashed_password = hash_password(&payload.password)?;

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, password, role, created_at
        "#,
    )
    .bind(payload.username.trim())
    .bind(payload.email.trim().to_lowercase())
    .bind(&hashed_password)
    .bind(payload.role.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!(
            "Username '{}' or email is already taken",
            payload.username
        )),
        other => {
            tracing::error!("Failed to register user: {:?}", other);
            other
        }
    })?;

    match company_name {
        Some(name) => {
            sqlx::query("INSERT INTO companies (user_id, name) VALUES ($1, $2)")
                .bind(user.id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }
        None => {
            sqlx::query("INSERT INTO student_profiles (user_id, full_name) VALUES ($1, $2)")
                .bind(user.id)
                .bind(payload.full_name.as_deref().map(str::trim))
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, role, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(payload.username.trim())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Same message for unknown user and bad password.
    let user = user.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let role = Role::parse(&user.role).ok_or_else(|| {
        AppError::InternalServerError(format!("User {} has unknown role '{}'", user.id, user.role))
    })?;

    let token = sign_jwt(user.id, role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
        "expires_in": config.jwt_expiration
    })))
}
