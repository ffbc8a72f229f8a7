//! Result/history sink: where per-question outcomes and per-session summaries go
//! after a quiz completes. Selection never depends on a sink succeeding.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::clock::{unix_secs, Clock};
use crate::error::QuizError;

/// Outcome of one answered question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutcomeRecord {
  #[serde(rename = "questionId", alias = "question_id")]
  pub question_id: String,
  pub question: String,
  #[serde(rename = "chosenOption", alias = "chosen_option", default)]
  pub chosen_option: Option<String>,
  #[serde(rename = "correctOption", alias = "correct_option")]
  pub correct_option: String,
  #[serde(rename = "isCorrect", alias = "is_correct")]
  pub is_correct: bool,
  /// Seconds.
  #[serde(rename = "timeTaken", alias = "time_taken", default)]
  pub time_taken: u64,
  #[serde(default)] pub level: String,
  #[serde(default)] pub domain: String,
  #[serde(default)] pub skill: String,
}

/// Summary of a completed quiz session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
  pub category: String,
  pub level: String,
  #[serde(default)] pub domain: String,
  #[serde(rename = "questionCount", alias = "question_count")]
  pub question_count: u32,
  /// Minutes.
  #[serde(rename = "timeLimit", alias = "time_limit")]
  pub time_limit: u32,
  /// Percent, 0-100.
  pub score: u32,
  #[serde(rename = "correctAnswers", alias = "correct_answers")]
  pub correct_answers: u32,
  #[serde(rename = "totalQuestions", alias = "total_questions")]
  pub total_questions: u32,
  /// Seconds.
  #[serde(rename = "timeTaken", alias = "time_taken")]
  pub time_taken: u64,
}

pub trait HistorySink: Send + Sync {
  fn record_outcomes(&self, session_id: &str, outcomes: &[OutcomeRecord]) -> Result<(), QuizError>;
  fn record_session(&self, session_id: &str, summary: &SessionSummary) -> Result<(), QuizError>;
}

/// Sink that only writes records to the log.
#[derive(Debug, Default)]
pub struct LogHistorySink;

impl HistorySink for LogHistorySink {
  fn record_outcomes(&self, session_id: &str, outcomes: &[OutcomeRecord]) -> Result<(), QuizError> {
    let correct = outcomes.iter().filter(|o| o.is_correct).count();
    info!(target: "history", %session_id, answered = outcomes.len(), correct, "Question outcomes");
    Ok(())
  }

  fn record_session(&self, session_id: &str, summary: &SessionSummary) -> Result<(), QuizError> {
    info!(
      target: "history",
      %session_id,
      category = %summary.category,
      level = %summary.level,
      score = summary.score,
      correct = summary.correct_answers,
      total = summary.total_questions,
      "Session summary"
    );
    Ok(())
  }
}

#[derive(Serialize)]
struct HistoryLine<'a, T: Serialize> {
  kind: &'static str,
  session_id: &'a str,
  recorded_at: u64,
  #[serde(flatten)]
  record: &'a T,
}

/// Appends one JSON object per line to a file.
pub struct JsonlHistorySink {
  path: PathBuf,
  clock: Box<dyn Clock>,
  // Serializes appends from concurrent requests.
  write_lock: Mutex<()>,
}

impl JsonlHistorySink {
  pub fn new(path: impl Into<PathBuf>, clock: Box<dyn Clock>) -> Self {
    Self { path: path.into(), clock, write_lock: Mutex::new(()) }
  }

  fn append<T: Serialize>(&self, lines: &[HistoryLine<'_, T>]) -> Result<(), QuizError> {
    let mut buf = Vec::new();
    for line in lines {
      serde_json::to_writer(&mut buf, line).map_err(|e| QuizError::History(e.to_string()))?;
      buf.push(b'\n');
    }
    let _guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .map_err(|e| QuizError::History(format!("{}: {}", self.path.display(), e)))?;
    file.write_all(&buf).map_err(|e| QuizError::History(format!("{}: {}", self.path.display(), e)))
  }
}

impl HistorySink for JsonlHistorySink {
  #[instrument(level = "debug", skip(self, outcomes), fields(count = outcomes.len()))]
  fn record_outcomes(&self, session_id: &str, outcomes: &[OutcomeRecord]) -> Result<(), QuizError> {
    let recorded_at = unix_secs(self.clock.now());
    let lines: Vec<HistoryLine<'_, OutcomeRecord>> = outcomes
      .iter()
      .map(|record| HistoryLine { kind: "outcome", session_id, recorded_at, record })
      .collect();
    self.append(&lines)
  }

  #[instrument(level = "debug", skip(self, summary))]
  fn record_session(&self, session_id: &str, summary: &SessionSummary) -> Result<(), QuizError> {
    let recorded_at = unix_secs(self.clock.now());
    self.append(&[HistoryLine { kind: "session", session_id, recorded_at, record: summary }])
  }
}
