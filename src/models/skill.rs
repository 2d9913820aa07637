// src/models/skill.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Proficiency level. Ordered: Beginner < Intermediate < Advanced < Expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// Fixed ordinal rank, Beginner = 1 through Expert = 4.
    pub fn rank(self) -> u32 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
            SkillLevel::Expert => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkillPriority {
    MustHave,
    NiceToHave,
}

impl SkillPriority {
    /// Points a requirement of this priority is worth. Must-have counts double.
    pub fn weight(self) -> f64 {
        match self {
            SkillPriority::MustHave => 20.0,
            SkillPriority::NiceToHave => 10.0,
        }
    }
}

/// A skill a job asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SkillRequirement {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub level: SkillLevel,
    pub priority: SkillPriority,
}

/// A skill a student claims on their profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CandidateSkill {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub level: SkillLevel,
}

/// Skill names compare case-insensitively, ignoring surrounding whitespace.
pub fn skill_key(name: &str) -> String {
    name.trim().to_lowercase()
}
