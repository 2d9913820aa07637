// src/scoring/error.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input the grader refuses to score at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Data problems that degrade the result instead of failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringWarning {
    /// The question bank sums to zero points; the result is forced to 0%.
    ZeroTotalPoints,
    /// An answer names a question that is not in the bank.
    OrphanedAnswer { question_id: String },
    /// More than one answer names the same question; the first one counts.
    DuplicateAnswer { question_id: String },
}
