//! Application state and the quiz session orchestrator.
//!
//! This module owns:
//!   - the engine configuration (categories, bounds, cooldown)
//!   - the question store
//!   - the recency tracker shared by every request (through the selector)
//!   - the history sink
//!
//! `get_questions` validates a request, loads the category, filters, and
//! hands the pool to the selector. It holds no selection logic of its own.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::{load_engine_config_from_env, CategoryConfig, EngineConfig};
use crate::domain::{LevelFilter, QuestionRecord};
use crate::error::QuizError;
use crate::filter::{filter_questions, FilterCriteria, ALL_DOMAINS};
use crate::history::{HistorySink, JsonlHistorySink, LogHistorySink};
use crate::protocol::QuizRequest;
use crate::recency::RecencyTracker;
use crate::selector::Selector;
use crate::store::{CsvQuestionStore, QuestionStore};

/// Questions chosen for one request.
#[derive(Clone, Debug)]
pub struct SelectionResult {
    pub questions: Vec<QuestionRecord>,
    /// The level/domain filters were dropped to meet the requested count.
    pub relaxed: bool,
}

/// A request that passed validation.
struct ValidatedRequest<'a> {
    category: &'a CategoryConfig,
    num_questions: usize,
    level: LevelFilter,
    domain: Option<String>,
}

pub struct AppState {
    pub config: EngineConfig,
    pub store: Arc<dyn QuestionStore>,
    pub tracker: Arc<RecencyTracker>,
    pub selector: Selector,
    pub sink: Arc<dyn HistorySink>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build state from env: config file, CSV store over the data dir, optional JSONL history.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let config = load_engine_config_from_env();
        let store = Arc::new(CsvQuestionStore::new(config.data_dir.clone()));

        let sink: Arc<dyn HistorySink> = match std::env::var("QUIZ_HISTORY_PATH") {
            Ok(path) => {
                info!(target: "quiz_backend", %path, "Recording quiz history to JSONL");
                Arc::new(JsonlHistorySink::new(path, Box::new(SystemClock)))
            }
            Err(_) => {
                info!(target: "quiz_backend", "QUIZ_HISTORY_PATH not set; quiz history goes to the log only");
                Arc::new(LogHistorySink)
            }
        };

        for c in &config.categories {
            info!(target: "quiz_backend", id = %c.id, name = %c.name, file = %c.file, domains = c.domains.len(), "Configured category");
        }
        info!(target: "quiz_backend", data_dir = %config.data_dir.display(), cooldown_secs = config.cooldown_secs, "Engine ready");

        Self::new(config, store, sink, Arc::new(SystemClock))
    }

    pub fn new(
        config: EngineConfig,
        store: Arc<dyn QuestionStore>,
        sink: Arc<dyn HistorySink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = Arc::new(RecencyTracker::new(config.cooldown()));
        let selector = Selector::new(tracker.clone(), clock.clone());
        Self { config, store, tracker, selector, sink, clock }
    }

    fn validate<'a>(&'a self, req: &QuizRequest) -> Result<ValidatedRequest<'a>, QuizError> {
        let category = self
            .config
            .category(&req.category)
            .ok_or_else(|| QuizError::configuration(format!("Unknown category '{}'", req.category)))?;

        let b = &self.config.bounds;
        if req.num_questions < b.min_questions || req.num_questions > b.max_questions {
            return Err(QuizError::configuration(format!(
                "numQuestions must be between {} and {} (got {})",
                b.min_questions, b.max_questions, req.num_questions
            )));
        }
        if req.duration < b.min_duration || req.duration > b.max_duration {
            return Err(QuizError::configuration(format!(
                "duration must be between {} and {} minutes (got {})",
                b.min_duration, b.max_duration, req.duration
            )));
        }
        let num_questions = usize::try_from(req.num_questions)
            .map_err(|_| QuizError::configuration(format!("Invalid numQuestions {}", req.num_questions)))?;

        let domain = match req.domain.as_deref().map(str::trim) {
            Some(d) if category.supports_domain() && !d.is_empty() && !d.eq_ignore_ascii_case(ALL_DOMAINS) => {
                let d = d.to_lowercase();
                if !category.domains.iter().any(|known| known.eq_ignore_ascii_case(&d)) {
                    return Err(QuizError::configuration(format!(
                        "Unknown domain '{}' for {}; expected one of: {}, {}",
                        d,
                        category.name,
                        category.domains.join(", "),
                        ALL_DOMAINS
                    )));
                }
                Some(d)
            }
            _ => None,
        };

        Ok(ValidatedRequest { category, num_questions, level: req.level, domain })
    }

    /// Validate, load, filter, select.
    #[instrument(level = "info", skip(self, req), fields(category = %req.category, num = req.num_questions))]
    pub fn get_questions(&self, req: &QuizRequest) -> Result<SelectionResult, QuizError> {
        let v = self.validate(req)?;

        let all = self.store.load_category(v.category);
        if all.is_empty() {
            return Err(QuizError::DataUnavailable { category: v.category.name.clone() });
        }

        let criteria = FilterCriteria {
            level: v.level,
            domain: v.domain.as_deref(),
            num_questions: v.num_questions,
        };
        let filtered = filter_questions(&all, &criteria, v.category.supports_domain());

        let questions = self.selector.select(
            &filtered.questions,
            v.num_questions,
            &v.category.id,
            req.session_token.as_deref(),
        );
        info!(
            target: "selection",
            category = %v.category.name,
            level = v.level.as_str(),
            domain = v.domain.as_deref().unwrap_or(ALL_DOMAINS),
            served = questions.len(),
            relaxed = filtered.relaxed,
            "Questions selected"
        );
        Ok(SelectionResult { questions, relaxed: filtered.relaxed })
    }

    /// How many questions of a category are inside their cooldown right now.
    /// Never touches the recency tables; only the selector mutates them.
    pub fn recently_served(&self, category_id: &str) -> usize {
        self.tracker.recent_count(category_id, self.clock.now())
    }
}
