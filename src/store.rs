//! Question Store Adapter: supplies every question of a category.
//!
//! Stores never fail outward. Load problems are logged and reported as an
//! empty sequence, which the orchestrator turns into `DataUnavailable`.

#[cfg(test)]
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, error, instrument, warn};

use crate::config::CategoryConfig;
use crate::domain::{QuestionRecord, RawQuestion};
use crate::error::QuizError;

pub trait QuestionStore: Send + Sync {
  fn load_category(&self, category: &CategoryConfig) -> Vec<QuestionRecord>;
}

/// Reads `<data_dir>/<category.file>` on every call, so edits to a bank are
/// picked up without a restart.
#[derive(Clone, Debug)]
pub struct CsvQuestionStore {
  data_dir: PathBuf,
}

impl CsvQuestionStore {
  pub fn new(data_dir: impl Into<PathBuf>) -> Self {
    Self { data_dir: data_dir.into() }
  }

  fn read_file(&self, path: &Path, category_id: &str) -> Result<Vec<QuestionRecord>, QuizError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut out = Vec::new();
    for (row, result) in reader.deserialize::<RawQuestion>().enumerate() {
      match result {
        Ok(raw) if raw.question.is_empty() => {
          warn!(target: "selection", category = %category_id, row = row + 1, "Skipping row with empty question text");
        }
        Ok(raw) => out.push(QuestionRecord::from_raw(category_id, raw)),
        Err(e) if e.is_io_error() => return Err(e.into()),
        Err(e) => {
          warn!(target: "selection", category = %category_id, row = row + 1, error = %e, "Skipping malformed question row");
        }
      }
    }
    Ok(out)
  }
}

impl QuestionStore for CsvQuestionStore {
  #[instrument(level = "debug", skip(self, category), fields(category = %category.id, file = %category.file))]
  fn load_category(&self, category: &CategoryConfig) -> Vec<QuestionRecord> {
    let path = self.data_dir.join(&category.file);
    match self.read_file(&path, &category.id) {
      Ok(questions) => {
        debug!(target: "selection", path = %path.display(), count = questions.len(), "Loaded question bank");
        questions
      }
      Err(e) => {
        error!(target: "selection", path = %path.display(), error = %e, "Failed to load question bank");
        Vec::new()
      }
    }
  }
}

/// Pre-loaded banks keyed by category id.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct MemoryQuestionStore {
  banks: HashMap<String, Vec<QuestionRecord>>,
}

#[cfg(test)]
impl MemoryQuestionStore {
  pub fn new() -> Self { Self::default() }

  pub fn with_category(mut self, category_id: impl Into<String>, questions: Vec<QuestionRecord>) -> Self {
    self.banks.insert(category_id.into(), questions);
    self
  }
}

#[cfg(test)]
impl QuestionStore for MemoryQuestionStore {
  fn load_category(&self, category: &CategoryConfig) -> Vec<QuestionRecord> {
    self.banks.get(&category.id).cloned().unwrap_or_default()
  }
}
