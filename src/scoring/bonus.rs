// src/scoring/bonus.rs

//! Location and job-type bonuses, composed on top of a skill match when
//! recommending jobs to a student. Applicant ranking never uses these.

use super::MatchResult;

/// Points each bonus dimension is worth: a fifth of a must-have skill.
pub const BONUS_WEIGHT: f64 = 20.0 * 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceBonus {
    /// The student stated this preference; `matched` says whether the job fits it.
    Stated { matched: bool },
    /// No preference given. Contributes neither earned nor possible points.
    NotStated,
}

impl PreferenceBonus {
    /// Remote jobs fit every location. Otherwise the job location must mention
    /// the preferred city.
    pub fn location(preferred: Option<&str>, job_location: &str, is_remote: bool) -> Self {
        match preferred.map(str::trim).filter(|p| !p.is_empty()) {
            None => PreferenceBonus::NotStated,
            Some(city) => PreferenceBonus::Stated {
                matched: is_remote || job_location.to_lowercase().contains(&city.to_lowercase()),
            },
        }
    }

    /// Blank entries count as no preference.
    pub fn job_type(preferred: &[String], job_type: &str) -> Self {
        let job_type = job_type.trim();
        let mut stated = preferred.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).peekable();
        if stated.peek().is_none() {
            return PreferenceBonus::NotStated;
        }
        PreferenceBonus::Stated {
            matched: stated.any(|t| t.eq_ignore_ascii_case(job_type)),
        }
    }
}

/// Adds each stated bonus to `base` and recomputes the bounded percentage.
pub fn compose(base: MatchResult, bonuses: &[PreferenceBonus]) -> MatchResult {
    let mut earned = base.earned_points;
    let mut possible = base.possible_points;

    for bonus in bonuses {
        if let PreferenceBonus::Stated { matched } = bonus {
            possible += BONUS_WEIGHT;
            if *matched {
                earned += BONUS_WEIGHT;
            }
        }
    }

    MatchResult::from_points(earned, possible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_jobs_match_any_city() {
        assert_eq!(
            PreferenceBonus::location(Some("Cebu"), "Manila", true),
            PreferenceBonus::Stated { matched: true }
        );
        assert_eq!(
            PreferenceBonus::location(Some("cebu"), "Cebu City", false),
            PreferenceBonus::Stated { matched: true }
        );
        assert_eq!(
            PreferenceBonus::location(Some("Davao"), "Cebu City", false),
            PreferenceBonus::Stated { matched: false }
        );
        assert_eq!(
            PreferenceBonus::location(Some("  "), "Cebu City", false),
            PreferenceBonus::NotStated
        );
    }

    #[test]
    fn job_type_preference() {
        let preferred = vec!["internship".to_string(), "ojt".to_string()];
        assert_eq!(
            PreferenceBonus::job_type(&preferred, "OJT"),
            PreferenceBonus::Stated { matched: true }
        );
        assert_eq!(
            PreferenceBonus::job_type(&preferred, "full-time"),
            PreferenceBonus::Stated { matched: false }
        );
        assert_eq!(PreferenceBonus::job_type(&[], "ojt"), PreferenceBonus::NotStated);
    }

    #[test]
    fn job_type_ignores_surrounding_whitespace() {
        let preferred = vec![" Internship ".to_string()];
        assert_eq!(
            PreferenceBonus::job_type(&preferred, "internship"),
            PreferenceBonus::Stated { matched: true }
        );
        assert_eq!(
            PreferenceBonus::job_type(&["internship".to_string()], " internship\n"),
            PreferenceBonus::Stated { matched: true }
        );
        assert_eq!(
            PreferenceBonus::job_type(&["  ".to_string()], "internship"),
            PreferenceBonus::NotStated
        );
    }

    #[test]
    fn compose_adds_only_stated_bonuses() {
        let base = MatchResult::from_points(10.0, 20.0);

        let unchanged = compose(base, &[PreferenceBonus::NotStated, PreferenceBonus::NotStated]);
        assert_eq!(unchanged, base);

        let both = compose(
            base,
            &[
                PreferenceBonus::Stated { matched: true },
                PreferenceBonus::Stated { matched: false },
            ],
        );
        assert_eq!(both.earned_points, 14.0);
        assert_eq!(both.possible_points, 28.0);
        assert_eq!(both.percentage, 50);
    }

    #[test]
    fn bonuses_alone_can_score_a_job_without_requirements() {
        let result = compose(
            MatchResult::EMPTY,
            &[PreferenceBonus::Stated { matched: true }],
        );
        assert_eq!(result.percentage, 100);
    }
}
