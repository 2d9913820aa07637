// src/scoring/mod.rs

//! Assessment grading and skill matching.
//!
//! Everything here is pure: no I/O, no shared state, inputs borrowed immutably.
//! Handlers call these inline and persist the outputs themselves.

pub mod bonus;
pub mod error;
pub mod grader;
pub mod matcher;

pub use bonus::{PreferenceBonus, compose};
pub use error::{ScoringError, ScoringWarning};
pub use grader::{QuestionOutcome, ScoreResult, SubmittedAnswer, grade};
pub use matcher::{MatchResult, score};

/// `round(100 * earned / possible)` with halves rounded up, clamped to [0, 100].
/// Returns 0 when `possible` is 0.
pub(crate) fn percent(earned: u64, possible: u64) -> u32 {
    if possible == 0 {
        return 0;
    }
    let pct = (200 * earned + possible) / (2 * possible);
    pct.min(100) as u32
}

/// Float counterpart of [`percent`] for fractional match points.
pub(crate) fn percent_f64(earned: f64, possible: f64) -> u32 {
    if possible <= 0.0 || !earned.is_finite() {
        return 0;
    }
    (100.0 * earned / possible).round().clamp(0.0, 100.0) as u32
}
