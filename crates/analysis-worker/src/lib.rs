pub use chess_core;

pub mod analyzer;
pub mod best_line;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod quality;
pub mod repository;
pub mod request;
pub mod score;
pub mod stockfish;

pub use analyzer::{analyze_game, AnalysisOutcome, AnalysisState};
pub use error::AnalysisError;
pub use repository::{AnalysisResult, GameRecord, GameRepository};
pub use request::{AnalysisRequest, EngineKind};
