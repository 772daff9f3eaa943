//! Engine session capability: what the analyzer needs from a chess engine.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so the
//! futures stay `Send` for generic callers (axum handlers, `tokio::spawn`).
//! Implementations are free to write them as `async fn`.

use std::future::Future;
use std::time::Duration;

use crate::error::AnalysisError;
use crate::score::Evaluation;

/// Engine options applied once when a session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub multipv: u32,
    pub skill_level: u32,
    pub threads: u32,
    pub hash_mb: u32,
}

/// Search budget for a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: u32,
    pub movetime: Duration,
    /// Hard limit after which the engine process is killed
    pub timeout: Duration,
}

/// One multi-PV slot of an engine answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub evaluation: Evaluation,
    /// First move of the line, UCI notation
    pub best_move: Option<String>,
    /// Principal variation, UCI notation
    pub principal_variation: Vec<String>,
}

impl CandidateLine {
    pub fn new(evaluation: Evaluation, principal_variation: Vec<String>) -> Self {
        Self {
            evaluation,
            best_move: principal_variation.first().cloned(),
            principal_variation,
        }
    }
}

/// Starts engine sessions by engine name.
pub trait EngineLauncher: Send + Sync {
    type Session: EngineSession;

    /// Start and configure an engine. Fails with `EngineUnavailable`.
    fn open(
        &self,
        engine: &str,
        options: &EngineOptions,
    ) -> impl Future<Output = Result<Self::Session, AnalysisError>> + Send;
}

/// A single engine conversation, owned by one analysis run.
pub trait EngineSession: Send {
    /// Search `fen` within `limits`.
    ///
    /// `Ok(None)` means the position has no legal continuation (mate,
    /// stalemate) and is not an error.
    fn evaluate(
        &mut self,
        fen: &str,
        limits: &SearchLimits,
    ) -> impl Future<Output = Result<Option<Vec<CandidateLine>>, AnalysisError>> + Send;

    /// Terminate the engine. Safe to call more than once and after failures.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
