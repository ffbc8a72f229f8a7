//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{error, info, instrument, warn};

use crate::domain::LevelFilter;
use crate::logic::{error_value, record_results, serve_questions_from_json};
use crate::protocol::*;
use crate::state::AppState;

/// Set on quiz responses when level/domain filters were dropped.
pub const RELAXED_HEADER: &str = "x-quiz-relaxed";

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_categories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let categories = state
    .config
    .categories
    .iter()
    .map(|c| CategoryOut::new(c, state.recently_served(&c.id)))
    .collect();
  Json(CategoriesOut {
    categories,
    levels: vec![LevelFilter::Beginner, LevelFilter::Intermediate, LevelFilter::Advanced, LevelFilter::Mixed],
    bounds: state.config.bounds.clone(),
  })
}

#[instrument(level = "info", skip(state, body), fields(body_len = body.len()))]
pub async fn http_post_quiz(State(state): State<Arc<AppState>>, body: String) -> Response {
  // CSV loading touches the filesystem; keep it off the async workers.
  let worker = state.clone();
  let joined = tokio::task::spawn_blocking(move || serve_questions_from_json(&worker, &body)).await;

  match joined {
    Ok(Ok(res)) => {
      info!(target: "selection", served = res.questions.len(), relaxed = res.relaxed, "HTTP quiz served");
      let relaxed = if res.relaxed { "true" } else { "false" };
      (StatusCode::OK, [(RELAXED_HEADER, relaxed)], Json(res.questions)).into_response()
    }
    Ok(Err(e)) => {
      warn!(target: "selection", error = %e, "HTTP quiz rejected");
      (e.status_code(), Json(error_value(&e))).into_response()
    }
    Err(e) => {
      error!(target: "quiz_backend", error = %e, "Quiz selection task failed");
      (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorOut { error: "Could not build quiz".into() })).into_response()
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(session_id = %body.session_id))]
pub async fn http_post_results(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ResultsIn>,
) -> impl IntoResponse {
  let out = record_results(state, body).await;
  (StatusCode::ACCEPTED, Json(out))
}
