//! Analysis error types

use std::time::Duration;

use chess_core::ReplayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Engine did not answer within {0:?}")]
    EngineTimeout(Duration),

    #[error("Malformed game: {0}")]
    MalformedGame(#[from] ReplayError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Analysis exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}
