// src/models/application.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::skill::CandidateSkill;

pub const APPLICATION_STATUSES: [&str; 4] = ["pending", "reviewed", "accepted", "rejected"];

/// Represents the 'applications' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub student_id: i64,
    pub cover_letter: Option<String>,
    /// Result of the job's custom assessment, if it has one.
    pub assessment_result_id: Option<i64>,
    pub status: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A student's own application, joined with the job it targets.
#[derive(Debug, Serialize, FromRow)]
pub struct MyApplication {
    pub id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub company_name: String,
    pub status: String,
    pub assessment_percentage: Option<i32>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Applicant row as read for ranking, before scoring.
#[derive(Debug, FromRow)]
pub struct ApplicantRow {
    pub application_id: i64,
    pub student_id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub skills: Option<Json<Vec<CandidateSkill>>>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub assessment_percentage: Option<i32>,
    pub assessment_passed: Option<bool>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ApplicantStudent {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicantAssessment {
    pub percentage: i32,
    pub passed: bool,
}

/// Applicant as returned by the ranking endpoint, best match first.
#[derive(Debug, Serialize)]
pub struct RankedApplicant {
    pub application_id: i64,
    pub student: ApplicantStudent,
    pub match_score: u32,
    pub status: String,
    pub cover_letter: Option<String>,
    pub assessment: Option<ApplicantAssessment>,
    pub applied_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for applying to a job.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
}

/// DTO for a company moving an application along.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateApplicationStatusRequest {
    #[validate(custom(function = validate_application_status))]
    pub status: String,
}

fn validate_application_status(status: &str) -> Result<(), validator::ValidationError> {
    if !APPLICATION_STATUSES.contains(&status) {
        return Err(validator::ValidationError::new("invalid_application_status"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_must_be_known() {
        let ok = UpdateApplicationStatusRequest {
            status: "accepted".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateApplicationStatusRequest {
            status: "hired".to_string(),
        };
        assert!(bad.validate().is_err());
    }
}
