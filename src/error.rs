//! Error taxonomy for the question selection service.

use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// Rejected before any filtering happens: unknown category, out-of-bounds
    /// count/duration, unknown domain, malformed request payload.
    #[error("{0}")]
    Configuration(String),

    /// The question store had nothing for the requested category.
    #[error("Could not load questions for category '{category}'. Please check the question bank.")]
    DataUnavailable { category: String },

    #[error("question bank i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("question bank parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Result/history sink failure. Logged, never a selection failure.
    #[error("history sink error: {0}")]
    History(String),
}

impl QuizError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        QuizError::Configuration(msg.into())
    }

    /// HTTP status used when this error crosses the request boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            QuizError::Configuration(_) => StatusCode::BAD_REQUEST,
            QuizError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            QuizError::Io(_) | QuizError::Csv(_) | QuizError::History(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
