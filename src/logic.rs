//! Request handling shared by the HTTP handlers and the one-shot process-call mode.
//!
//! This includes:
//!   - turning a raw JSON payload into a question list or an `{error}` object
//!   - forwarding quiz results to the history sink without ever failing the caller

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::error::QuizError;
use crate::protocol::{ErrorOut, QuizRequest, ResultsIn, ResultsOut};
use crate::state::{AppState, SelectionResult};
use crate::util::trunc_for_log;

pub fn error_value(e: &QuizError) -> Value {
  serde_json::to_value(ErrorOut { error: e.to_string() })
    .unwrap_or_else(|_| serde_json::json!({ "error": "internal error" }))
}

/// Parse a raw configuration payload and select questions for it.
pub fn serve_questions_from_json(state: &AppState, payload: &str) -> Result<SelectionResult, QuizError> {
  let req: QuizRequest = serde_json::from_str(payload).map_err(|e| {
    warn!(target: "quiz_backend", payload = %trunc_for_log(payload, 200), error = %e, "Rejected quiz payload");
    QuizError::configuration(format!("Invalid quiz configuration: {}", e))
  })?;
  state.get_questions(&req)
}

/// Process-call mode: one payload in, one JSON document out (array or `{error}`).
#[instrument(level = "info", skip(state, payload), fields(payload_len = payload.len()))]
pub fn process_call(state: &AppState, payload: &str) -> Value {
  match serve_questions_from_json(state, payload) {
    Ok(res) => serde_json::to_value(&res.questions).unwrap_or_else(|e| {
      error!(target: "quiz_backend", error = %e, "Failed to serialize questions");
      serde_json::json!({ "error": format!("Serialization error: {}", e) })
    }),
    Err(e) => {
      warn!(target: "quiz_backend", error = %e, "Quiz request failed");
      error_value(&e)
    }
  }
}

/// Hand results to the sink on a blocking thread. Sink failures are logged and
/// reported as `persisted: false`; they never become request errors.
#[instrument(level = "info", skip(state, body), fields(session_id = %body.session_id, outcomes = body.outcomes.len()))]
pub async fn record_results(state: Arc<AppState>, body: ResultsIn) -> ResultsOut {
  let session_id = body.session_id.clone();
  let joined = tokio::task::spawn_blocking(move || {
    let sink = &state.sink;
    let mut persisted = true;
    if !body.outcomes.is_empty() {
      if let Err(e) = sink.record_outcomes(&body.session_id, &body.outcomes) {
        error!(target: "history", session_id = %body.session_id, error = %e, "Failed to record question outcomes");
        persisted = false;
      }
    }
    if let Some(summary) = &body.summary {
      if let Err(e) = sink.record_session(&body.session_id, summary) {
        error!(target: "history", session_id = %body.session_id, error = %e, "Failed to record session summary");
        persisted = false;
      }
    }
    persisted
  })
  .await;

  let persisted = match joined {
    Ok(p) => p,
    Err(e) => {
      error!(target: "history", %session_id, error = %e, "History task aborted");
      false
    }
  };
  info!(target: "history", %session_id, persisted, "Quiz results accepted");
  ResultsOut { accepted: true, persisted }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::ManualClock;
  use crate::config::EngineConfig;
  use crate::history::{HistorySink, OutcomeRecord, SessionSummary};
  use crate::state::tests::{bank, test_state};
  use crate::store::MemoryQuestionStore;

  struct FailingSink;

  impl HistorySink for FailingSink {
    fn record_outcomes(&self, _: &str, _: &[OutcomeRecord]) -> Result<(), QuizError> {
      Err(QuizError::History("database down".into()))
    }
    fn record_session(&self, _: &str, _: &SessionSummary) -> Result<(), QuizError> {
      Err(QuizError::History("database down".into()))
    }
  }

  #[test]
  fn process_call_returns_question_array() {
    let out = process_call(&test_state(), r#"{"quiz_type":"1","num_questions":4,"duration":10,"level":"Mixed","session_id":"api_123"}"#);
    let arr = out.as_array().expect("array");
    assert_eq!(arr.len(), 4);
    assert!(arr[0]["id"].is_string());
    assert!(arr[0]["option_a"].is_string());
  }

  #[test]
  fn process_call_reports_errors_as_objects() {
    let state = test_state();
    let out = process_call(&state, r#"{"category":"7"}"#);
    assert!(out["error"].as_str().expect("error").contains("Unknown category"));
    let out = process_call(&state, "not json");
    assert!(out["error"].as_str().expect("error").starts_with("Invalid quiz configuration"));
  }

  #[tokio::test]
  async fn sink_failure_does_not_fail_the_request() {
    let state = Arc::new(AppState::new(
      EngineConfig::default(),
      Arc::new(MemoryQuestionStore::new().with_category("1", bank("1", 5))),
      Arc::new(FailingSink),
      Arc::new(ManualClock::at_secs(0)),
    ));
    let body: ResultsIn = serde_json::from_str(r#"{
      "sessionId": "s-1",
      "outcomes": [{"questionId":"x","question":"Q","correctOption":"A","isCorrect":true}],
      "summary": {"category":"1","level":"Mixed","questionCount":1,"timeLimit":5,"score":100,"correctAnswers":1,"totalQuestions":1,"timeTaken":30}
    }"#).expect("body");
    let out = record_results(state.clone(), body).await;
    assert!(out.accepted);
    assert!(!out.persisted);

    // Selection still works afterwards.
    assert!(state.get_questions(&serde_json::from_str(r#"{"numQuestions":2,"level":"Mixed"}"#).expect("req")).is_ok());
  }

  #[tokio::test]
  async fn working_sink_reports_persisted() {
    let body: ResultsIn = serde_json::from_str(r#"{"session_id":"s-2","outcomes":[]}"#).expect("body");
    let out = record_results(Arc::new(test_state()), body).await;
    assert!(out.accepted && out.persisted);
  }
}
