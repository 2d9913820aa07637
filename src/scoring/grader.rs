// src/scoring/grader.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{ScoringError, ScoringWarning, percent};
use crate::models::question::{Category, Question, QuestionType};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// One answer from a learner. A missing or null `raw_answer` means unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub raw_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub is_correct: bool,
    pub points_awarded: u32,
}

/// Graded attempt. Stored as-is in `assessment_results.score_record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: u32,
    pub total_possible: u32,
    pub percentage: u32,
    pub passed: bool,
    pub per_question: Vec<QuestionOutcome>,
    pub category_breakdown: BTreeMap<Category, u32>,
    #[serde(default)]
    pub warnings: Vec<ScoringWarning>,
}

/// Grades `answers` against `questions`.
///
/// Answers are matched by question id only, both sides compared trimmed.
/// Unanswered questions score zero, answers naming unknown questions are
/// ignored with a warning. A bank worth zero points grades to 0% with a
/// warning instead of failing.
pub fn grade(
    questions: &[Question],
    answers: &[SubmittedAnswer],
    passing_score: u32,
) -> Result<ScoreResult, ScoringError> {
    validate_questions(questions)?;
    if passing_score > 100 {
        return Err(ScoringError::InvalidInput(format!(
            "passing score {passing_score} is above 100"
        )));
    }

    let known: HashSet<&str> = questions.iter().map(|q| q.id.trim()).collect();
    let mut warnings = Vec::new();
    let mut by_id: HashMap<&str, Option<&str>> = HashMap::with_capacity(answers.len());

    for (idx, answer) in answers.iter().enumerate() {
        let question_id = match answer.question_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(ScoringError::InvalidInput(format!(
                    "answer #{} has no question id",
                    idx + 1
                )));
            }
        };

        if !known.contains(question_id) {
            warnings.push(ScoringWarning::OrphanedAnswer {
                question_id: question_id.to_string(),
            });
            continue;
        }

        if by_id.contains_key(question_id) {
            warnings.push(ScoringWarning::DuplicateAnswer {
                question_id: question_id.to_string(),
            });
            continue;
        }
        by_id.insert(question_id, answer.raw_answer.as_deref());
    }

    let mut per_question = Vec::with_capacity(questions.len());
    let mut by_category: BTreeMap<Category, (u64, u64)> = BTreeMap::new();
    let mut total_score: u64 = 0;
    let mut total_possible: u64 = 0;

    for question in questions {
        let id = question.id.trim();
        let given = by_id.get(id).copied().flatten();
        let is_correct = given.is_some_and(|raw| answers_match(question, raw));
        let points_awarded = if is_correct { question.points } else { 0 };

        total_score += u64::from(points_awarded);
        total_possible += u64::from(question.points);

        let entry = by_category.entry(question.category).or_default();
        entry.0 += u64::from(points_awarded);
        entry.1 += u64::from(question.points);

        per_question.push(QuestionOutcome {
            question_id: id.to_string(),
            is_correct,
            points_awarded,
        });
    }

    if total_possible == 0 {
        warnings.push(ScoringWarning::ZeroTotalPoints);
    }

    let percentage = percent(total_score, total_possible);
    let category_breakdown = by_category
        .into_iter()
        .map(|(category, (earned, possible))| (category, percent(earned, possible)))
        .collect();

    Ok(ScoreResult {
        total_score: clamp_u32(total_score),
        total_possible: clamp_u32(total_possible),
        percentage,
        passed: percentage >= passing_score,
        per_question,
        category_breakdown,
        warnings,
    })
}

fn validate_questions(questions: &[Question]) -> Result<(), ScoringError> {
    if questions.is_empty() {
        return Err(ScoringError::InvalidInput(
            "assessment has no questions".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(questions.len());
    for question in questions {
        let id = question.id.trim();
        if id.is_empty() {
            return Err(ScoringError::InvalidInput(
                "question without an id".to_string(),
            ));
        }
        if !seen.insert(id) {
            return Err(ScoringError::InvalidInput(format!(
                "duplicate question id '{id}'"
            )));
        }
    }
    Ok(())
}

/// Coding answers keep their internal whitespace; everything else is compared
/// trimmed, whitespace-collapsed and case-folded.
fn answers_match(question: &Question, raw: &str) -> bool {
    match question.question_type {
        QuestionType::Coding => raw.trim() == question.correct_answer.trim(),
        QuestionType::MultipleChoice | QuestionType::TrueFalse | QuestionType::ShortAnswer => {
            normalize(raw) == normalize(&question.correct_answer)
        }
    }
}

pub(crate) fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_lowercase()
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
