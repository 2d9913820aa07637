// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// How a question is answered, and therefore how its answer is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Coding,
}

impl QuestionType {
    /// Choice types must carry a non-empty option list.
    pub fn has_options(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

/// Skill domain a question belongs to. Used for the per-category breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Programming,
    Database,
    WebDevelopment,
    Networking,
    ProblemSolving,
}

/// A single scored question, stored inside its assessment's `questions` JSONB column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// Stable identifier, unique within the owning assessment.
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    #[validate(length(min = 1, max = 2000))]
    pub text: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    #[validate(length(min = 1, max = 5000))]
    pub correct_answer: String,

    pub category: Category,

    #[validate(range(min = 1, max = 1000))]
    pub points: u32,
}

/// Question as shown to a learner: no correct answer.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub category: Category,
    pub points: u32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            text: q.text.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
            category: q.category,
            points: q.points,
        }
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() > 10 {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("invalid_option_length"));
        }
    }
    Ok(())
}

/// Cross-field checks the derive rules cannot express.
pub fn validate_question_set(questions: &[Question]) -> Result<(), validator::ValidationError> {
    if questions.is_empty() {
        return Err(validator::ValidationError::new("questions_cannot_be_empty"));
    }
    let mut seen = std::collections::HashSet::new();
    for q in questions {
        if q.id.trim() != q.id {
            return Err(validator::ValidationError::new("question_id_has_padding"));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(validator::ValidationError::new("duplicate_question_id"));
        }
        if q.question_type.has_options() {
            if q.options.is_empty() {
                return Err(validator::ValidationError::new("options_cannot_be_empty"));
            }
            if !q.options.iter().any(|o| o == &q.correct_answer) {
                return Err(validator::ValidationError::new("answer_not_in_options"));
            }
        }
    }
    Ok(())
}
