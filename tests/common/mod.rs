#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use analysis_worker::engine::{
    CandidateLine, EngineLauncher, EngineOptions, EngineSession, SearchLimits,
};
use analysis_worker::score::Evaluation;
use analysis_worker::{AnalysisError, AnalysisResult, GameRecord, GameRepository};

/// 1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7#
pub const SCHOLARS_MATE: &str = "[Event \"Casual\"]\n[White \"Alice\"]\n[Black \"Bob\"]\n[Result \"1-0\"]\n\n1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0\n";

/// 1. f3 e5 2. g4 Qh4#
pub const FOOLS_MATE: &str = "1. f3 e5 2. g4 Qh4# 0-1";

/// Main line 1. e4 e5 2. Nf3 with comments and side lines around it.
pub const SIDE_LINES: &str = "[Event \"Annotated\"]\n\n1. e4 {best by test} (1. d4 d5 2. c4) 1... e5 2. Nf3 (2. f4 exf4 {gambit}) *\n";

/// Third move is a king walking two squares.
pub const ILLEGAL_THIRD_PLY: &str = "1. e4 e5 2. Ke3 Nc6";

// ---------------------------------------------------------------------------
// Scripted engine
// ---------------------------------------------------------------------------

/// One scripted answer to `evaluate`.
#[derive(Clone, Debug)]
pub enum Step {
    Line(Evaluation, &'static [&'static str]),
    Lines(Vec<CandidateLine>),
    NoMove,
    Crash,
    Hang,
}

pub fn cp(value: i32, pv: &'static [&'static str]) -> Step {
    Step::Line(Evaluation::centipawns(value), pv)
}

pub fn mate(value: i32, pv: &'static [&'static str]) -> Step {
    Step::Line(Evaluation::mate(value), pv)
}

#[derive(Default)]
struct EngineState {
    script: Mutex<VecDeque<Step>>,
    positions: Mutex<Vec<String>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

/// Launcher whose sessions answer from a shared script, then `cp 20` forever.
#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    state: Arc<EngineState>,
}

impl ScriptedLauncher {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let launcher = Self::default();
        launcher.push(steps);
        launcher
    }

    pub fn push(&self, steps: impl IntoIterator<Item = Step>) {
        self.state.script.lock().unwrap().extend(steps);
    }

    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// FENs sent to the engine, in order
    pub fn positions(&self) -> Vec<String> {
        self.state.positions.lock().unwrap().clone()
    }
}

impl EngineLauncher for ScriptedLauncher {
    type Session = ScriptedSession;

    async fn open(
        &self,
        _engine: &str,
        _options: &EngineOptions,
    ) -> Result<ScriptedSession, AnalysisError> {
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct ScriptedSession {
    state: Arc<EngineState>,
}

impl EngineSession for ScriptedSession {
    async fn evaluate(
        &mut self,
        fen: &str,
        _limits: &SearchLimits,
    ) -> Result<Option<Vec<CandidateLine>>, AnalysisError> {
        self.state.positions.lock().unwrap().push(fen.to_string());
        let step = self
            .state
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Line(Evaluation::centipawns(20), &[]));

        match step {
            Step::Line(evaluation, pv) => Ok(Some(vec![CandidateLine::new(
                evaluation,
                pv.iter().map(|m| m.to_string()).collect(),
            )])),
            Step::Lines(lines) => Ok(Some(lines)),
            Step::NoMove => Ok(None),
            Step::Crash => Err(AnalysisError::EngineUnavailable(
                "scripted engine exited unexpectedly".into(),
            )),
            Step::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// In-memory repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RepoState {
    games: Mutex<HashMap<String, GameRecord>>,
    analyses: Mutex<HashMap<String, AnalysisResult>>,
    flag_history: Mutex<Vec<bool>>,
    upserts: AtomicUsize,
    fail_upsert: AtomicBool,
    fail_fetch_analysis: AtomicBool,
    fail_mark_analysing: AtomicBool,
}

#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<RepoState>,
}

impl InMemoryRepository {
    pub fn with_game(id: &str, pgn: &str) -> Self {
        let repo = Self::default();
        repo.insert_game(id, pgn);
        repo
    }

    pub fn insert_game(&self, id: &str, pgn: &str) {
        let game = GameRecord {
            id: id.to_string(),
            pgn: pgn.to_string(),
            white: "Alice".to_string(),
            black: "Bob".to_string(),
            white_rating: Some(1500),
            black_rating: Some(1480),
            date: Some("2024.03.01".to_string()),
            analysing: false,
        };
        self.state.games.lock().unwrap().insert(id.to_string(), game);
    }

    pub fn analysis(&self, id: &str) -> Option<AnalysisResult> {
        self.state.analyses.lock().unwrap().get(id).cloned()
    }

    pub fn analysing(&self, id: &str) -> bool {
        self.state
            .games
            .lock()
            .unwrap()
            .get(id)
            .is_some_and(|g| g.analysing)
    }

    /// Every value the analysing flag was set to, in order
    pub fn flag_history(&self) -> Vec<bool> {
        self.state.flag_history.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> usize {
        self.state.upserts.load(Ordering::SeqCst)
    }

    /// Make every `upsert_analysis` fail
    pub fn fail_upsert(&self) {
        self.state.fail_upsert.store(true, Ordering::SeqCst);
    }

    /// Make every `fetch_analysis` fail
    pub fn fail_fetch_analysis(&self) {
        self.state.fail_fetch_analysis.store(true, Ordering::SeqCst);
    }

    /// Make `set_analysing(_, true)` fail; clearing still works
    pub fn fail_mark_analysing(&self) {
        self.state.fail_mark_analysing.store(true, Ordering::SeqCst);
    }
}

fn unavailable(operation: &str) -> AnalysisError {
    AnalysisError::Persistence(format!("{operation}: connection refused"))
}

impl GameRepository for InMemoryRepository {
    async fn fetch_game(&self, game_id: &str) -> Result<Option<GameRecord>, AnalysisError> {
        Ok(self.state.games.lock().unwrap().get(game_id).cloned())
    }

    async fn fetch_analysis(&self, game_id: &str) -> Result<Option<AnalysisResult>, AnalysisError> {
        if self.state.fail_fetch_analysis.load(Ordering::SeqCst) {
            return Err(unavailable("fetch_analysis"));
        }
        Ok(self.analysis(game_id))
    }

    async fn upsert_analysis(&self, result: &AnalysisResult) -> Result<(), AnalysisError> {
        if self.state.fail_upsert.load(Ordering::SeqCst) {
            return Err(unavailable("upsert_analysis"));
        }
        self.state.upserts.fetch_add(1, Ordering::SeqCst);
        self.state
            .analyses
            .lock()
            .unwrap()
            .insert(result.game_id.clone(), result.clone());
        Ok(())
    }

    async fn set_analysing(&self, game_id: &str, analysing: bool) -> Result<(), AnalysisError> {
        if analysing && self.state.fail_mark_analysing.load(Ordering::SeqCst) {
            return Err(unavailable("set_analysing"));
        }
        self.state.flag_history.lock().unwrap().push(analysing);
        if let Some(game) = self.state.games.lock().unwrap().get_mut(game_id) {
            game.analysing = analysing;
        }
        Ok(())
    }
}
