//! Loading engine configuration (question-bank categories, request bounds, cooldown) from TOML.
//!
//! See `EngineConfig` for the expected schema. Every field has a default, so an
//! empty file (or no file at all) yields the stock three-category setup.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const DEFAULT_COOLDOWN_SECS: u64 = 3600;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Directory holding the per-category CSV files.
  pub data_dir: PathBuf,
  /// How long a served question stays "recently used".
  pub cooldown_secs: u64,
  pub bounds: Bounds,
  pub categories: Vec<CategoryConfig>,
}

/// Inclusive limits on what a caller may request.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Bounds {
  pub min_questions: i64,
  pub max_questions: i64,
  /// Minutes.
  pub min_duration: i64,
  pub max_duration: i64,
}

impl Default for Bounds {
  fn default() -> Self {
    Self { min_questions: 1, max_questions: 50, min_duration: 5, max_duration: 120 }
  }
}

impl Bounds {
  /// Zero-question requests must never reach the engine, whatever the file says.
  pub fn check(&self) -> Result<(), String> {
    if self.min_questions < 1 {
      return Err(format!("min_questions must be at least 1 (got {})", self.min_questions));
    }
    if self.min_questions > self.max_questions {
      return Err(format!("min_questions {} exceeds max_questions {}", self.min_questions, self.max_questions));
    }
    if self.min_duration < 1 {
      return Err(format!("min_duration must be at least 1 (got {})", self.min_duration));
    }
    if self.min_duration > self.max_duration {
      return Err(format!("min_duration {} exceeds max_duration {}", self.min_duration, self.max_duration));
    }
    Ok(())
  }
}

/// One question bank.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CategoryConfig {
  pub id: String,
  pub name: String,
  /// CSV file name, relative to `data_dir`.
  pub file: String,
  /// Allowed domain filters. Non-empty means this category supports domain filtering.
  #[serde(default)] pub domains: Vec<String>,
}

impl CategoryConfig {
  pub fn supports_domain(&self) -> bool { !self.domains.is_empty() }
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from("data"),
      cooldown_secs: DEFAULT_COOLDOWN_SECS,
      bounds: Bounds::default(),
      categories: default_categories(),
    }
  }
}

fn default_categories() -> Vec<CategoryConfig> {
  let technical_domains = [
    "webdev", "python", "database", "cybersecurity", "machine_learning",
    "networking", "devops", "cloud_computing", "programming",
  ];
  vec![
    CategoryConfig {
      id: "1".into(),
      name: "Cognitive Skills".into(),
      file: "cognitive_skills.csv".into(),
      domains: vec![],
    },
    CategoryConfig {
      id: "2".into(),
      name: "Technical Skills".into(),
      file: "technical_skills.csv".into(),
      domains: technical_domains.iter().map(|d| d.to_string()).collect(),
    },
    CategoryConfig {
      id: "3".into(),
      name: "Soft Skills".into(),
      file: "soft_skills.csv".into(),
      domains: vec![],
    },
  ]
}

impl EngineConfig {
  pub fn cooldown(&self) -> Duration { Duration::from_secs(self.cooldown_secs) }

  /// Resolve a category by id, or by case-insensitive name.
  pub fn category(&self, key: &str) -> Option<&CategoryConfig> {
    let key = key.trim();
    self.categories
      .iter()
      .find(|c| c.id == key)
      .or_else(|| self.categories.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
  }

  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str::<EngineConfig>(s)
  }

  /// Parse and reject configs whose bounds would admit invalid requests.
  pub fn parse_checked(s: &str) -> Result<Self, String> {
    let cfg = Self::from_toml_str(s).map_err(|e| e.to_string())?;
    cfg.bounds.check()?;
    Ok(cfg)
  }
}

/// Load `EngineConfig` from QUIZ_CONFIG_PATH (defaults on any IO/parse/bounds error),
/// then apply the QUIZ_DATA_DIR override.
pub fn load_engine_config_from_env() -> EngineConfig {
  let mut cfg = match std::env::var("QUIZ_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match EngineConfig::parse_checked(&s) {
        Ok(cfg) => {
          info!(target: "quiz_backend", %path, categories = cfg.categories.len(), "Loaded engine config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "quiz_backend", %path, error = %e, "Invalid TOML config; using defaults");
          EngineConfig::default()
        }
      },
      Err(e) => {
        error!(target: "quiz_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
        EngineConfig::default()
      }
    },
    Err(_) => EngineConfig::default(),
  };

  if let Ok(dir) = std::env::var("QUIZ_DATA_DIR") {
    cfg.data_dir = PathBuf::from(dir);
  }
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_toml_gives_stock_setup() {
    let cfg = EngineConfig::from_toml_str("").expect("parse");
    assert_eq!(cfg.cooldown_secs, 3600);
    assert_eq!(cfg.bounds.max_questions, 50);
    assert_eq!(cfg.categories.len(), 3);
    assert!(cfg.category("2").expect("technical").supports_domain());
    assert!(!cfg.category("1").expect("cognitive").supports_domain());
  }

  #[test]
  fn overrides_and_custom_categories() {
    let cfg = EngineConfig::from_toml_str(r#"
      data_dir = "/srv/banks"
      cooldown_secs = 120

      [bounds]
      max_questions = 20

      [[categories]]
      id = "rust"
      name = "Rust Basics"
      file = "rust.csv"
      domains = ["ownership", "traits"]
    "#).expect("parse");
    assert_eq!(cfg.data_dir, PathBuf::from("/srv/banks"));
    assert_eq!(cfg.cooldown(), Duration::from_secs(120));
    assert_eq!(cfg.bounds.max_questions, 20);
    assert_eq!(cfg.bounds.min_questions, 1);
    assert_eq!(cfg.categories.len(), 1);
    assert_eq!(cfg.category("rust basics").map(|c| c.id.as_str()), Some("rust"));
  }

  #[test]
  fn bounds_admitting_zero_questions_are_rejected() {
    let err = EngineConfig::parse_checked("[bounds]\nmin_questions = 0\n").expect_err("min 0");
    assert!(err.contains("min_questions"));
    assert!(EngineConfig::parse_checked("[bounds]\nmin_questions = -2\n").is_err());
  }

  #[test]
  fn inverted_bounds_are_rejected() {
    assert!(EngineConfig::parse_checked("[bounds]\nmin_questions = 30\nmax_questions = 10\n").is_err());
    assert!(EngineConfig::parse_checked("[bounds]\nmin_duration = 60\nmax_duration = 30\n").is_err());
    assert!(EngineConfig::parse_checked("[bounds]\nmax_questions = 20\n").is_ok());
  }

  #[test]
  fn example_config_matches_defaults() {
    let cfg = EngineConfig::parse_checked(include_str!("../config/quiz.example.toml")).expect("parse");
    let stock = EngineConfig::default();
    assert_eq!(cfg.cooldown_secs, stock.cooldown_secs);
    assert_eq!(cfg.categories.len(), stock.categories.len());
    assert_eq!(cfg.category("2").map(|c| c.domains.clone()), stock.category("2").map(|c| c.domains.clone()));
  }

  #[test]
  fn category_lookup_by_name_is_case_insensitive() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.category("technical skills").map(|c| c.id.as_str()), Some("2"));
    assert_eq!(cfg.category(" 3 ").map(|c| c.name.as_str()), Some("Soft Skills"));
    assert!(cfg.category("9").is_none());
  }
}
