//! Game analysis run: replay a stored game, evaluate every position with the
//! engine, classify each move and persist the result.
//!
//! A run moves through `Checking -> (SkippedExisting | Running) -> Persisting
//! -> Done`, or `Failed` from any step. The in-progress flag is set only once
//! the run commits to analysing and is cleared on every exit; the engine
//! session is closed exactly once after it was opened.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chess_core::pgn::STANDARD_START_FEN;
use chess_core::{replay, uci_line_to_san, Replay};
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::best_line::select_best_line;
use crate::config::AnalysisConfig;
use crate::engine::{EngineLauncher, EngineSession, SearchLimits};
use crate::error::AnalysisError;
use crate::quality::{classify_move, MoveQuality};
use crate::repository::{AnalysisResult, GameRecord, GameRepository};
use crate::request::AnalysisRequest;
use crate::score::Evaluation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Checking,
    SkippedExisting,
    Running,
    Persisting,
    Done,
    Failed,
}

impl AnalysisState {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisState::Idle => "idle",
            AnalysisState::Checking => "checking",
            AnalysisState::SkippedExisting => "skipped_existing",
            AnalysisState::Running => "running",
            AnalysisState::Persisting => "persisting",
            AnalysisState::Done => "done",
            AnalysisState::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// A result was persisted. `plies_analyzed < total_plies` when the
    /// engine reported no continuation before the end of the game.
    Completed {
        plies_analyzed: usize,
        total_plies: usize,
    },
    /// A stored result exists and the request did not force a new run.
    SkippedExisting,
}

/// Per-ply sequences accumulated while the engine walks the game.
#[derive(Debug, Default)]
struct PlyAnalysis {
    scores: Vec<Evaluation>,
    moves_quality: Vec<MoveQuality>,
    variants: Vec<String>,
}

/// Analyze one game end to end.
pub async fn analyze_game<L, R>(
    launcher: &L,
    repo: &R,
    config: &AnalysisConfig,
    request: &AnalysisRequest,
) -> Result<AnalysisOutcome, AnalysisError>
where
    L: EngineLauncher,
    R: GameRepository,
{
    let game_id = request.game_id.as_str();
    let deadline = Instant::now() + config.run_timeout;
    let budget = config.run_timeout;
    transition(game_id, AnalysisState::Idle);

    transition(game_id, AnalysisState::Checking);
    let game = match check(repo, request, deadline, budget).await {
        Ok(Some(game)) => game,
        Ok(None) => {
            transition(game_id, AnalysisState::SkippedExisting);
            return Ok(AnalysisOutcome::SkippedExisting);
        }
        Err(e) => {
            transition(game_id, AnalysisState::Failed);
            return Err(e);
        }
    };

    let result = match within(deadline, budget, repo.set_analysing(game_id, true)).await {
        Ok(()) => run(launcher, repo, config, request, &game, deadline).await,
        Err(e) => Err(e),
    };

    if let Err(e) = repo.set_analysing(game_id, false).await {
        warn!(game_id, error = %e, "Failed to clear analysing flag");
    }

    match &result {
        Ok(AnalysisOutcome::Completed {
            plies_analyzed,
            total_plies,
        }) => {
            transition(game_id, AnalysisState::Done);
            info!(game_id, plies_analyzed, total_plies, "Analysis complete");
        }
        Ok(AnalysisOutcome::SkippedExisting) => {}
        Err(e) => {
            transition(game_id, AnalysisState::Failed);
            warn!(game_id, error = %e, "Analysis failed");
        }
    }

    result
}

/// Load the game; `None` when a stored result makes the run unnecessary.
async fn check<R: GameRepository>(
    repo: &R,
    request: &AnalysisRequest,
    deadline: Instant,
    budget: Duration,
) -> Result<Option<GameRecord>, AnalysisError> {
    let game_id = request.game_id.as_str();
    let game = within(deadline, budget, repo.fetch_game(game_id))
        .await?
        .ok_or_else(|| AnalysisError::GameNotFound(game_id.to_string()))?;

    let existing = within(deadline, budget, repo.fetch_analysis(game_id)).await?;
    if existing.is_some() && !request.force_analysis {
        info!(game_id, "Analysis already stored, skipping");
        return Ok(None);
    }
    if existing.is_some() {
        info!(game_id, "Re-analysing on request");
    }

    Ok(Some(game))
}

async fn run<L, R>(
    launcher: &L,
    repo: &R,
    config: &AnalysisConfig,
    request: &AnalysisRequest,
    game: &GameRecord,
    deadline: Instant,
) -> Result<AnalysisOutcome, AnalysisError>
where
    L: EngineLauncher,
    R: GameRepository,
{
    let game_id = game.id.as_str();
    let budget = config.run_timeout;
    transition(game_id, AnalysisState::Running);

    let moves = replay(&game.pgn)?;
    let total_plies = moves.total_plies();
    let headers = moves.headers();
    info!(
        game_id,
        white = headers.white.as_deref().unwrap_or(game.white.as_str()),
        black = headers.black.as_deref().unwrap_or(game.black.as_str()),
        white_elo = ?headers.white_elo,
        black_elo = ?headers.black_elo,
        result = ?headers.result,
        date = ?headers.date,
        total_plies,
        engine = %request.engine,
        "Evaluating positions"
    );

    let mut session = within(
        deadline,
        budget,
        launcher.open(request.engine.as_str(), &request.engine_options()),
    )
    .await?;

    let movetime = Duration::from_millis(request.movetime.into());
    let limits = request.search_limits(config.search_timeout(movetime));
    let evaluated = evaluate_plies(&mut session, moves, &limits, game_id, deadline, budget).await;
    session.close().await;
    let plies = evaluated?;

    transition(game_id, AnalysisState::Persisting);
    let result = AnalysisResult {
        game_id: game_id.to_string(),
        date: Utc::now(),
        scores: plies.scores,
        moves_quality: plies.moves_quality,
        variants: plies.variants,
        engine: request.engine.as_str().to_string(),
        depth: request.depth,
        multipv: request.multipv,
        skill_level: request.skill_level,
        movetime: request.movetime,
        threads: request.threads,
    };
    within(deadline, budget, repo.upsert_analysis(&result)).await?;

    Ok(AnalysisOutcome::Completed {
        plies_analyzed: result.plies(),
        total_plies,
    })
}

/// Walk the game, stopping early when the engine has no continuation.
async fn evaluate_plies<S: EngineSession>(
    session: &mut S,
    moves: Replay,
    limits: &SearchLimits,
    game_id: &str,
    deadline: Instant,
    budget: Duration,
) -> Result<PlyAnalysis, AnalysisError> {
    let mut analysis = PlyAnalysis::default();

    let start = within(deadline, budget, session.evaluate(STANDARD_START_FEN, limits)).await?;
    let Some(mut previous) = start.and_then(select_best_line) else {
        warn!(game_id, "No evaluation for the starting position");
        return Ok(analysis);
    };

    for ply in moves {
        let ply = ply?;
        let lines = within(deadline, budget, session.evaluate(&ply.fen, limits)).await?;
        let Some(best) = lines.and_then(select_best_line) else {
            debug!(game_id, ply = ply.ply, san = %ply.san, "No legal continuation");
            break;
        };

        analysis
            .moves_quality
            .push(classify_move(previous.evaluation, best.evaluation));
        analysis.scores.push(best.evaluation);
        analysis
            .variants
            .push(uci_line_to_san(&ply.position, &best.principal_variation));
        previous = best;
    }

    Ok(analysis)
}

/// Bound a step of the run by its overall deadline.
async fn within<T, F>(deadline: Instant, budget: Duration, step: F) -> Result<T, AnalysisError>
where
    F: Future<Output = Result<T, AnalysisError>>,
{
    tokio::time::timeout_at(deadline, step)
        .await
        .map_err(|_| AnalysisError::DeadlineExceeded(budget))?
}

fn transition(game_id: &str, state: AnalysisState) {
    debug!(game_id, state = %state, "Analysis state");
}
