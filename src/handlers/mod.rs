// src/handlers/mod.rs

pub mod admin;
pub mod application;
pub mod assessment;
pub mod auth;
pub mod job;
pub mod matching;
pub mod profile;

use axum::Json;
use serde_json::{Value, json};

/// Liveness check. Does not touch the database.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
