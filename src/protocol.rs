//! Public protocol structs for the HTTP and process-call boundaries (serde ready).
//! Field names are camelCase; the snake_case names older clients send are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::config::{Bounds, CategoryConfig};
use crate::domain::LevelFilter;
use crate::history::{OutcomeRecord, SessionSummary};

/// Quiz configuration payload.
#[derive(Clone, Debug, Deserialize)]
pub struct QuizRequest {
    #[serde(default = "default_category", alias = "quiz_type")]
    pub category: String,
    #[serde(default = "default_num_questions", rename = "numQuestions", alias = "num_questions")]
    pub num_questions: i64,
    /// Minutes.
    #[serde(default = "default_duration")]
    pub duration: i64,
    #[serde(default)]
    pub level: LevelFilter,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, rename = "sessionToken", alias = "session_id", alias = "sessionId")]
    pub session_token: Option<String>,
}

fn default_category() -> String {
    "1".into()
}
fn default_num_questions() -> i64 {
    10
}
fn default_duration() -> i64 {
    30
}

/// Error reply used on every boundary.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryOut {
    pub id: String,
    pub name: String,
    pub domains: Vec<String>,
    /// Questions of this category currently inside their cooldown window.
    #[serde(rename = "recentlyServed")]
    pub recently_served: usize,
}

impl CategoryOut {
    pub fn new(c: &CategoryConfig, recently_served: usize) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            domains: c.domains.clone(),
            recently_served,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoriesOut {
    pub categories: Vec<CategoryOut>,
    pub levels: Vec<LevelFilter>,
    pub bounds: Bounds,
}

/// Results of a finished quiz, forwarded to the history sink.
#[derive(Debug, Deserialize)]
pub struct ResultsIn {
    #[serde(rename = "sessionId", alias = "session_id")]
    pub session_id: String,
    #[serde(default)]
    pub outcomes: Vec<OutcomeRecord>,
    #[serde(default)]
    pub summary: Option<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct ResultsOut {
    pub accepted: bool,
    /// False when the sink failed; the results were still accepted.
    pub persisted: bool,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
