//! Crate error type
//!
//! Only the outer layer (settings, scenarios, file I/O) is fallible. The
//! simulation itself degrades by logging.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("no timing point in effect at {0} ms")]
    NoTimingPoint(i64),
}

pub type Result<T> = std::result::Result<T, Error>;
