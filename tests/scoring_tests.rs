// tests/scoring_tests.rs

use ojt_backend::models::question::{Category, Question, QuestionType};
use ojt_backend::models::skill::{CandidateSkill, SkillLevel, SkillPriority, SkillRequirement};
use ojt_backend::scoring::{MatchResult, ScoringError, SubmittedAnswer, grade, score};

fn bank() -> Vec<Question> {
    let categories = [
        Category::Programming,
        Category::Database,
        Category::Database,
        Category::Networking,
        Category::Programming,
        Category::ProblemSolving,
        Category::Database,
    ];
    categories
        .iter()
        .enumerate()
        .map(|(i, category)| Question {
            id: format!("q{i}"),
            text: format!("Question {i}"),
            question_type: QuestionType::ShortAnswer,
            options: Vec::new(),
            correct_answer: format!("answer {i}"),
            category: *category,
            points: (i as u32 % 3) + 1,
        })
        .collect()
}

/// Answers exactly the questions whose bit is set in `mask`, correctly.
fn answers_for(mask: u32, questions: &[Question]) -> Vec<SubmittedAnswer> {
    questions
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, q)| SubmittedAnswer {
            question_id: Some(q.id.clone()),
            raw_answer: Some(q.correct_answer.to_uppercase()),
        })
        .collect()
}

#[test]
fn every_answer_subset_stays_in_bounds_and_passes_consistently() {
    let questions = bank();

    for mask in 0..(1u32 << questions.len()) {
        let answers = answers_for(mask, &questions);
        for passing_score in [0, 50, 60, 100] {
            let result = grade(&questions, &answers, passing_score).unwrap();
            assert!(result.percentage <= 100);
            assert_eq!(result.passed, result.percentage >= passing_score);
            assert!(result.total_score <= result.total_possible);
        }
    }
}

#[test]
fn full_marks_and_no_answers() {
    let questions = bank();

    let perfect = grade(&questions, &answers_for(u32::MAX, &questions), 100).unwrap();
    assert_eq!(perfect.percentage, 100);
    assert!(perfect.passed);
    assert!(perfect.category_breakdown.values().all(|pct| *pct == 100));

    let blank = grade(&questions, &[], 0).unwrap();
    assert_eq!(blank.percentage, 0);
    assert!(blank.passed);
    assert!(blank.per_question.iter().all(|q| !q.is_correct));
}

#[test]
fn breakdown_never_invents_categories() {
    let result = grade(&bank(), &[], 60).unwrap();
    let keys: Vec<Category> = result.category_breakdown.keys().copied().collect();
    assert_eq!(
        keys,
        vec![
            Category::Programming,
            Category::Database,
            Category::Networking,
            Category::ProblemSolving,
        ]
    );
    assert!(!result.category_breakdown.contains_key(&Category::WebDevelopment));
}

#[test]
fn empty_bank_fails_loudly() {
    let answers = [SubmittedAnswer {
        question_id: Some("q0".to_string()),
        raw_answer: Some("x".to_string()),
    }];
    assert!(matches!(
        grade(&[], &answers, 60),
        Err(ScoringError::InvalidInput(_))
    ));
}

#[test]
fn match_score_is_monotonic_in_candidate_level() {
    let requirements = [
        SkillRequirement {
            name: "Rust".to_string(),
            level: SkillLevel::Expert,
            priority: SkillPriority::MustHave,
        },
        SkillRequirement {
            name: "Docker".to_string(),
            level: SkillLevel::Intermediate,
            priority: SkillPriority::NiceToHave,
        },
    ];

    let mut previous = 0;
    for level in [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Expert,
    ] {
        let candidate = [
            CandidateSkill {
                name: "rust".to_string(),
                level,
            },
            CandidateSkill {
                name: "docker".to_string(),
                level: SkillLevel::Beginner,
            },
        ];
        let result = score(&requirements, &candidate);
        assert!(result.percentage >= previous);
        assert!(result.percentage <= 100);
        assert_eq!(result.possible_points, 30.0);
        previous = result.percentage;
    }
    // 20 + 10 * 1/2 of 30
    assert_eq!(previous, 83);
}

#[test]
fn no_requirements_means_no_match() {
    let candidate = [CandidateSkill {
        name: "SQL".to_string(),
        level: SkillLevel::Expert,
    }];
    assert_eq!(score(&[], &candidate), MatchResult::EMPTY);
    assert_eq!(score(&[], &[]).percentage, 0);
}
