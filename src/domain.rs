//! Domain models: question identity, difficulty levels, and the question record itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identity of a question, derived from its prompt text.
///
/// Two questions with byte-identical prompts share an identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
  /// First 8 bytes of SHA-256 over the prompt, hex encoded.
  pub fn from_prompt(prompt: &str) -> Self {
    let digest = Sha256::digest(prompt.as_bytes());
    let hex = digest[..8].iter().map(|b| format!("{:02x}", b)).collect::<String>();
    QuestionId(hex)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for QuestionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Difficulty carried by a question in the bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
  #[serde(alias = "beginner", alias = "BEGINNER")]
  Beginner,
  #[serde(alias = "intermediate", alias = "INTERMEDIATE")]
  Intermediate,
  #[serde(alias = "advanced", alias = "ADVANCED")]
  Advanced,
}

/// Difficulty requested by a caller. `Mixed` admits every difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelFilter {
  #[serde(alias = "beginner")]
  Beginner,
  #[default]
  #[serde(alias = "intermediate")]
  Intermediate,
  #[serde(alias = "advanced")]
  Advanced,
  #[serde(alias = "mixed")]
  Mixed,
}

impl LevelFilter {
  pub fn admits(self, d: Difficulty) -> bool {
    match self {
      LevelFilter::Mixed => true,
      LevelFilter::Beginner => d == Difficulty::Beginner,
      LevelFilter::Intermediate => d == Difficulty::Intermediate,
      LevelFilter::Advanced => d == Difficulty::Advanced,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      LevelFilter::Beginner => "Beginner",
      LevelFilter::Intermediate => "Intermediate",
      LevelFilter::Advanced => "Advanced",
      LevelFilter::Mixed => "Mixed",
    }
  }
}

/// One row of a question bank as it appears on disk.
#[derive(Clone, Debug, Deserialize)]
pub struct RawQuestion {
  pub question: String,
  #[serde(alias = "option_A")] pub option_a: String,
  #[serde(alias = "option_B")] pub option_b: String,
  #[serde(alias = "option_C")] pub option_c: String,
  #[serde(alias = "option_D")] pub option_d: String,
  pub correct_option: String,
  pub level: Difficulty,
  #[serde(default)] pub skills: String,
  #[serde(default)] pub domain: String,
  #[serde(default)] pub skill: String,
}

/// Question as served by the engine. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
  pub id: QuestionId,
  pub category: String,
  pub question: String,
  pub option_a: String,
  pub option_b: String,
  pub option_c: String,
  pub option_d: String,
  pub correct_option: String,
  pub level: Difficulty,
  /// Skill tags used for domain matching (e.g. "python, webdev").
  #[serde(default)] pub skills: String,
  #[serde(default)] pub domain: String,
  #[serde(default)] pub skill: String,
}

impl QuestionRecord {
  pub fn from_raw(category: &str, raw: RawQuestion) -> Self {
    Self {
      id: QuestionId::from_prompt(&raw.question),
      category: category.to_string(),
      question: raw.question,
      option_a: raw.option_a,
      option_b: raw.option_b,
      option_c: raw.option_c,
      option_d: raw.option_d,
      correct_option: raw.correct_option.trim().to_uppercase(),
      level: raw.level,
      skills: raw.skills,
      domain: raw.domain,
      skill: raw.skill,
    }
  }

  /// Case-insensitive substring match of `domain` against the skill tags.
  pub fn matches_domain(&self, domain: &str) -> bool {
    self.skills.to_lowercase().contains(&domain.to_lowercase())
  }
}

#[cfg(test)]
pub(crate) fn sample_question(category: &str, prompt: &str, level: Difficulty, skills: &str) -> QuestionRecord {
  QuestionRecord::from_raw(category, RawQuestion {
    question: prompt.into(),
    option_a: "A".into(),
    option_b: "B".into(),
    option_c: "C".into(),
    option_d: "D".into(),
    correct_option: "a".into(),
    level,
    skills: skills.into(),
    domain: String::new(),
    skill: String::new(),
  })
}
