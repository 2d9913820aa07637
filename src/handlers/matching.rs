// src/handlers/matching.rs

use std::cmp::Reverse;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    config::RECOMMENDATION_POOL_SIZE,
    error::AppError,
    handlers::{job::fetch_owned_job, profile::fetch_student_profile},
    models::{
        application::{ApplicantAssessment, ApplicantRow, ApplicantStudent, RankedApplicant},
        job::{JOB_COLUMNS, JOB_FROM, Job, RecommendationParams, RecommendedJob},
        profile::StudentProfile,
        skill::SkillRequirement,
    },
    scoring::{self, PreferenceBonus},
    utils::jwt::Claims,
};

/// Skill match plus the student's location and job-type preferences.
fn recommendation_score(profile: &StudentProfile, job: &Job) -> u32 {
    let base = scoring::score(&job.required_skills, &profile.skills);
    let bonuses = [
        PreferenceBonus::location(
            profile.preferred_location.as_deref(),
            &job.location,
            job.is_remote,
        ),
        PreferenceBonus::job_type(&profile.preferred_job_types, &job.job_type),
    ];
    scoring::compose(base, &bonuses).percentage
}

/// Scores every job for `profile`, best first. Ties keep the input order.
pub(crate) fn rank_jobs(
    profile: &StudentProfile,
    jobs: Vec<Job>,
    min_score: u32,
    limit: usize,
) -> Vec<RecommendedJob> {
    let mut ranked: Vec<RecommendedJob> = jobs
        .into_iter()
        .map(|job| RecommendedJob {
            match_score: recommendation_score(profile, &job),
            job,
        })
        .filter(|r| r.match_score >= min_score)
        .collect();

    ranked.sort_by_key(|r| Reverse(r.match_score));
    ranked.truncate(limit);
    ranked
}

/// Scores applicants on skills alone, best first. Earlier applications win ties.
pub(crate) fn rank_applicants(
    requirements: &[SkillRequirement],
    rows: Vec<ApplicantRow>,
) -> Vec<RankedApplicant> {
    let mut ranked: Vec<RankedApplicant> = rows
        .into_iter()
        .map(|row| {
            let skills = row.skills.map(|s| s.0).unwrap_or_default();
            let assessment = match (row.assessment_percentage, row.assessment_passed) {
                (Some(percentage), Some(passed)) => Some(ApplicantAssessment { percentage, passed }),
                _ => None,
            };
            RankedApplicant {
                application_id: row.application_id,
                student: ApplicantStudent {
                    id: row.student_id,
                    username: row.username,
                    full_name: row.full_name,
                },
                match_score: scoring::score(requirements, &skills).percentage,
                status: row.status,
                cover_letter: row.cover_letter,
                assessment,
                applied_at: row.created_at,
            }
        })
        .collect();

    ranked.sort_by_key(|a| (Reverse(a.match_score), a.applied_at));
    ranked
}

/// Open jobs ranked for the calling student. Jobs already applied to are skipped.
pub async fn recommend_jobs(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<RecommendationParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let profile = fetch_student_profile(&pool, user_id).await?;

    let jobs = sqlx::query_as::<_, Job>(&format!(
        r#"
        SELECT {} {}
        WHERE j.status = 'open'
          AND NOT EXISTS (
              SELECT 1 FROM applications ap WHERE ap.job_id = j.id AND ap.student_id = $1
          )
        ORDER BY j.created_at DESC, j.id DESC
        LIMIT $2
        "#,
        JOB_COLUMNS, JOB_FROM
    ))
    .bind(user_id)
    .bind(RECOMMENDATION_POOL_SIZE)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load jobs for recommendations: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let min_score = params.min_score.unwrap_or(0).min(100);

    Ok(Json(rank_jobs(&profile, jobs, min_score, limit)))
}

/// Applicants for one of the caller's jobs, best skill match first.
pub async fn list_applicants(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let job = fetch_owned_job(&pool, job_id, &claims).await?;

    let rows = sqlx::query_as::<_, ApplicantRow>(
        r#"
        SELECT
            ap.id AS application_id, ap.student_id, u.username, sp.full_name, sp.skills,
            ap.cover_letter, ap.status,
            r.percentage AS assessment_percentage, r.passed AS assessment_passed,
            ap.created_at
        FROM applications ap
        JOIN users u ON u.id = ap.student_id
        LEFT JOIN student_profiles sp ON sp.user_id = ap.student_id
        LEFT JOIN assessment_results r ON r.id = ap.assessment_result_id
        WHERE ap.job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load applicants: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rank_applicants(&job.required_skills, rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::{CandidateSkill, SkillLevel, SkillPriority};
    use chrono::{TimeZone, Utc};
    use sqlx::types::Json as SqlJson;

    fn sql_requirement() -> SkillRequirement {
        SkillRequirement {
            name: "SQL".to_string(),
            level: SkillLevel::Advanced,
            priority: SkillPriority::MustHave,
        }
    }

    fn job(id: i64, location: &str, is_remote: bool, job_type: &str) -> Job {
        Job {
            id,
            company_id: 1,
            company_name: "Acme".to_string(),
            title: format!("Job {id}"),
            description: String::new(),
            location: location.to_string(),
            is_remote,
            job_type: job_type.to_string(),
            required_skills: SqlJson(vec![sql_requirement()]),
            status: "open".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn profile(level: SkillLevel) -> StudentProfile {
        StudentProfile {
            user_id: 9,
            full_name: None,
            bio: None,
            skills: SqlJson(vec![CandidateSkill {
                name: "sql".to_string(),
                level,
            }]),
            preferred_location: Some("Cebu".to_string()),
            preferred_job_types: SqlJson(vec!["internship".to_string()]),
            updated_at: None,
        }
    }

    fn applicant(id: i64, level: Option<SkillLevel>, minute: u32) -> ApplicantRow {
        ApplicantRow {
            application_id: id,
            student_id: id * 10,
            username: format!("student{id}"),
            full_name: None,
            skills: level.map(|level| {
                SqlJson(vec![CandidateSkill {
                    name: "SQL".to_string(),
                    level,
                }])
            }),
            cover_letter: None,
            status: "pending".to_string(),
            assessment_percentage: None,
            assessment_passed: None,
            created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap()),
        }
    }

    #[test]
    fn preferences_lift_matching_jobs() {
        let jobs = vec![
            job(1, "Manila", false, "full-time"),
            job(2, "Cebu City", false, "internship"),
            job(3, "Davao", true, "full-time"),
        ];
        let ranked = rank_jobs(&profile(SkillLevel::Intermediate), jobs, 0, 10);

        // Skill part: 40/3 of 20 for every job.
        let ids: Vec<i64> = ranked.iter().map(|r| r.job.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranked[0].match_score, 76); // (13.33 + 8) / 28
        assert_eq!(ranked[1].match_score, 62); // (13.33 + 4) / 28
        assert_eq!(ranked[2].match_score, 48); // 13.33 / 28
    }

    #[test]
    fn min_score_and_limit_apply() {
        let jobs = vec![
            job(1, "Manila", false, "full-time"),
            job(2, "Cebu City", false, "internship"),
            job(3, "Davao", true, "full-time"),
        ];
        let ranked = rank_jobs(&profile(SkillLevel::Intermediate), jobs, 50, 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].job.id, 2);
    }

    #[test]
    fn applicants_rank_by_skill_with_partial_credit() {
        let rows = vec![
            applicant(1, None, 0),
            applicant(2, Some(SkillLevel::Intermediate), 1),
            applicant(3, Some(SkillLevel::Expert), 2),
            applicant(4, Some(SkillLevel::Advanced), 3),
        ];
        let ranked = rank_applicants(&[sql_requirement()], rows);

        let order: Vec<(i64, u32)> = ranked
            .iter()
            .map(|a| (a.application_id, a.match_score))
            .collect();
        assert_eq!(order, vec![(3, 100), (4, 100), (2, 67), (1, 0)]);
    }
}
