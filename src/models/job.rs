// src/models/job.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::skill::SkillRequirement;

pub const JOB_TYPES: [&str; 5] = ["full-time", "part-time", "internship", "ojt", "contract"];

/// Upper bound on skills a single posting may list.
pub const MAX_REQUIRED_SKILLS: usize = 30;

pub const JOB_STATUSES: [&str; 2] = ["open", "closed"];

/// Columns selected for every `Job` read, joined with the posting company.
pub const JOB_COLUMNS: &str = r#"
    j.id, j.company_id, COALESCE(c.name, u.username) AS company_name,
    j.title, j.description, j.location, j.is_remote, j.job_type,
    j.required_skills, j.status, j.created_at, j.updated_at
"#;

/// FROM clause matching `JOB_COLUMNS`.
pub const JOB_FROM: &str = r#"
    FROM jobs j
    JOIN users u ON u.id = j.company_id
    LEFT JOIN companies c ON c.user_id = j.company_id
"#;

/// Represents the 'jobs' table, joined with the company display name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: i64,
    pub company_id: i64,
    pub company_name: String,
    pub title: String,

    /// Sanitized HTML.
    pub description: String,

    pub location: String,
    pub is_remote: bool,

    /// One of `JOB_TYPES`.
    pub job_type: String,

    /// Stored as a JSON array in the database.
    pub required_skills: Json<Vec<SkillRequirement>>,

    /// 'open' or 'closed'.
    pub status: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for posting a job.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub description: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[serde(default)]
    pub is_remote: bool,
    #[validate(custom(function = validate_job_type))]
    pub job_type: String,
    #[serde(default)]
    #[validate(nested)]
    pub required_skills: Vec<SkillRequirement>,
}

/// DTO for editing a job. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    pub is_remote: Option<bool>,
    #[validate(custom(function = validate_job_type))]
    pub job_type: Option<String>,
    #[validate(nested)]
    pub required_skills: Option<Vec<SkillRequirement>>,
    #[validate(custom(function = validate_job_status))]
    pub status: Option<String>,
}

impl UpdateJobRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.is_remote.is_none()
            && self.job_type.is_none()
            && self.required_skills.is_none()
            && self.status.is_none()
    }
}

/// Query parameters for listing jobs.
#[derive(Debug, Deserialize)]
pub struct JobListParams {
    /// Title keyword.
    pub q: Option<String>,
    pub job_type: Option<String>,
    /// Substring of the job location.
    pub location: Option<String>,
    pub remote: Option<bool>,
    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for recommendations.
#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    /// Number of jobs to return (default: 10, max: 50).
    pub limit: Option<usize>,
    /// Drop jobs scoring below this percentage.
    pub min_score: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedJob {
    pub job: Job,
    pub match_score: u32,
}

pub fn validate_job_type(job_type: &str) -> Result<(), validator::ValidationError> {
    if !JOB_TYPES.contains(&job_type) {
        return Err(validator::ValidationError::new("invalid_job_type"));
    }
    Ok(())
}

fn validate_job_status(status: &str) -> Result<(), validator::ValidationError> {
    if !JOB_STATUSES.contains(&status) {
        return Err(validator::ValidationError::new("invalid_job_status"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_job_validation() {
        let req: CreateJobRequest = serde_json::from_value(serde_json::json!({
            "title": "Backend Intern",
            "description": "<p>Build APIs</p>",
            "location": "Cebu City",
            "job_type": "internship",
            "required_skills": [
                {"name": "SQL", "level": "Intermediate", "priority": "must-have"}
            ]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(!req.is_remote);

        let req: CreateJobRequest = serde_json::from_value(serde_json::json!({
            "title": "Backend Intern",
            "description": "x",
            "location": "Cebu City",
            "job_type": "freelance"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_job_emptiness_and_status() {
        let empty: UpdateJobRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.is_empty());

        let bad: UpdateJobRequest =
            serde_json::from_value(serde_json::json!({"status": "archived"})).unwrap();
        assert!(!bad.is_empty());
        assert!(bad.validate().is_err());
    }
}
