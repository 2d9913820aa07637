// src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

use crate::models::{
    job::validate_job_type,
    question::Category,
    skill::CandidateSkill,
};

/// Represents the 'student_profiles' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentProfile {
    pub user_id: i64,
    pub full_name: Option<String>,
    pub bio: Option<String>,

    /// Self-declared skills used for job matching.
    pub skills: Json<Vec<CandidateSkill>>,

    /// City the student wants to work in. Remote jobs always fit.
    pub preferred_location: Option<String>,

    /// Any of the job types in `job::JOB_TYPES`.
    pub preferred_job_types: Json<Vec<String>>,

    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Latest general skills assessment outcome, shown on the profile.
#[derive(Debug, Serialize)]
pub struct AssessmentSnapshot {
    pub assessment_id: i64,
    pub percentage: i32,
    pub passed: bool,
    pub category_breakdown: std::collections::BTreeMap<Category, u32>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub latest_assessment: Option<AssessmentSnapshot>,
}

/// DTO for updating a student profile. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(nested)]
    pub skills: Option<Vec<CandidateSkill>>,
    #[validate(length(max = 100))]
    pub preferred_location: Option<String>,
    #[validate(custom(function = validate_job_types))]
    pub preferred_job_types: Option<Vec<String>>,
}

fn validate_job_types(types: &[String]) -> Result<(), validator::ValidationError> {
    for t in types {
        validate_job_type(t)?;
    }
    Ok(())
}

/// Represents the 'companies' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Company {
    pub user_id: i64,
    pub name: String,
    pub website: Option<String>,
    pub location: Option<String>,

    /// Sanitized HTML.
    pub description: Option<String>,

    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for updating a company profile. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub website: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
}

/// Validates that a string is an http(s) URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_website_must_be_http() {
        let ok = UpdateCompanyRequest {
            name: None,
            website: Some("https://acme.example".to_string()),
            location: None,
            description: None,
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateCompanyRequest {
            website: Some("javascript:alert(1)".to_string()),
            ..ok
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn profile_job_types_are_checked() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "preferred_job_types": ["internship", "gig"]
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "skills": [{"name": "SQL", "level": "Intermediate"}],
            "preferred_job_types": ["internship", "ojt"]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
