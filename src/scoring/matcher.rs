// src/scoring/matcher.rs

use std::collections::HashMap;

use serde::Serialize;

use super::percent_f64;
use crate::models::skill::{CandidateSkill, SkillLevel, SkillRequirement, skill_key};

/// Fit between a job's required skills and a candidate's skills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub percentage: u32,
    pub earned_points: f64,
    pub possible_points: f64,
}

impl MatchResult {
    pub const EMPTY: MatchResult = MatchResult {
        percentage: 0,
        earned_points: 0.0,
        possible_points: 0.0,
    };

    pub(crate) fn from_points(earned_points: f64, possible_points: f64) -> Self {
        Self {
            percentage: percent_f64(earned_points, possible_points),
            earned_points,
            possible_points,
        }
    }
}

/// Scores `candidate` against `requirements`.
///
/// Each requirement is worth its priority weight. A candidate at or above the
/// required level earns it in full, a candidate below earns
/// `weight * candidate_rank / required_rank`, a missing skill earns nothing.
/// No requirements means 0%.
pub fn score(requirements: &[SkillRequirement], candidate: &[CandidateSkill]) -> MatchResult {
    if requirements.is_empty() {
        return MatchResult::EMPTY;
    }

    // Highest claimed level wins if a profile lists a skill twice.
    let mut levels: HashMap<String, SkillLevel> = HashMap::with_capacity(candidate.len());
    for skill in candidate {
        let level = levels.entry(skill_key(&skill.name)).or_insert(skill.level);
        if skill.level > *level {
            *level = skill.level;
        }
    }

    let mut earned = 0.0;
    let mut possible = 0.0;

    for requirement in requirements {
        let weight = requirement.priority.weight();
        possible += weight;

        if let Some(have) = levels.get(&skill_key(&requirement.name)) {
            let have = have.rank();
            let want = requirement.level.rank();
            earned += if have >= want {
                weight
            } else {
                weight * f64::from(have) / f64::from(want)
            };
        }
    }

    MatchResult::from_points(earned, possible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::SkillPriority;

    fn req(name: &str, level: SkillLevel, priority: SkillPriority) -> SkillRequirement {
        SkillRequirement {
            name: name.to_string(),
            level,
            priority,
        }
    }

    fn has(name: &str, level: SkillLevel) -> CandidateSkill {
        CandidateSkill {
            name: name.to_string(),
            level,
        }
    }

    #[test]
    fn no_requirements_is_zero() {
        let result = score(&[], &[has("Rust", SkillLevel::Expert)]);
        assert_eq!(result, MatchResult::EMPTY);
    }

    #[test]
    fn partial_credit_below_required_level() {
        let result = score(
            &[req("SQL", SkillLevel::Advanced, SkillPriority::MustHave)],
            &[has("SQL", SkillLevel::Intermediate)],
        );
        assert!((result.earned_points - 40.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.possible_points, 20.0);
        assert_eq!(result.percentage, 67);
    }

    #[test]
    fn names_match_case_insensitively() {
        let result = score(
            &[req("JavaScript", SkillLevel::Beginner, SkillPriority::NiceToHave)],
            &[has(" javascript ", SkillLevel::Advanced)],
        );
        assert_eq!(result.percentage, 100);
        assert_eq!(result.earned_points, 10.0);
    }

    #[test]
    fn must_have_weighs_double() {
        let requirements = vec![
            req("Rust", SkillLevel::Intermediate, SkillPriority::MustHave),
            req("Docker", SkillLevel::Beginner, SkillPriority::NiceToHave),
        ];

        let only_must = score(&requirements, &[has("rust", SkillLevel::Expert)]);
        assert_eq!(only_must.possible_points, 30.0);
        assert_eq!(only_must.percentage, 67);

        let only_nice = score(&requirements, &[has("docker", SkillLevel::Beginner)]);
        assert_eq!(only_nice.percentage, 33);
    }

    #[test]
    fn missing_skills_earn_nothing() {
        let result = score(
            &[req("Go", SkillLevel::Beginner, SkillPriority::MustHave)],
            &[],
        );
        assert_eq!(result.percentage, 0);
        assert_eq!(result.possible_points, 20.0);
    }

    #[test]
    fn duplicate_profile_entries_use_highest_level() {
        let result = score(
            &[req("Python", SkillLevel::Advanced, SkillPriority::MustHave)],
            &[
                has("Python", SkillLevel::Beginner),
                has("python", SkillLevel::Expert),
            ],
        );
        assert_eq!(result.percentage, 100);
    }
}
