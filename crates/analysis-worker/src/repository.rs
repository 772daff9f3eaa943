//! Game repository seam: where games come from and where analyses go.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::quality::MoveQuality;
use crate::score::Evaluation;

/// Stored game, read-only input to the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub pgn: String,
    pub white: String,
    pub black: String,
    pub white_rating: Option<i32>,
    pub black_rating: Option<i32>,
    pub date: Option<String>,
    /// Set while an analysis run is in flight
    pub analysing: bool,
}

/// Persisted outcome of one analysis run, unique per game.
///
/// `scores`, `moves_quality` and `variants` are parallel: entry `i`
/// describes ply `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub game_id: String,
    pub date: DateTime<Utc>,
    /// Evaluation after each ply, White's point of view
    pub scores: Vec<Evaluation>,
    pub moves_quality: Vec<MoveQuality>,
    /// Engine continuation after each ply, space-separated SAN
    pub variants: Vec<String>,
    pub engine: String,
    pub depth: u32,
    pub multipv: u32,
    pub skill_level: u32,
    pub movetime: u32,
    pub threads: u32,
}

impl AnalysisResult {
    pub fn plies(&self) -> usize {
        self.scores.len()
    }
}

pub trait GameRepository: Send + Sync {
    fn fetch_game(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Option<GameRecord>, AnalysisError>> + Send;

    fn fetch_analysis(
        &self,
        game_id: &str,
    ) -> impl Future<Output = Result<Option<AnalysisResult>, AnalysisError>> + Send;

    /// Insert, or replace the existing analysis of the same game.
    fn upsert_analysis(
        &self,
        result: &AnalysisResult,
    ) -> impl Future<Output = Result<(), AnalysisError>> + Send;

    fn set_analysing(
        &self,
        game_id: &str,
        analysing: bool,
    ) -> impl Future<Output = Result<(), AnalysisError>> + Send;
}
