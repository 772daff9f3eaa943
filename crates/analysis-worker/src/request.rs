//! Analysis request parameters, validated at the edge.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::engine::{EngineOptions, SearchLimits};

/// Engines the pipeline knows how to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Stockfish,
}

impl EngineKind {
    /// Binary name, resolved inside the configured engine directory.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Stockfish => "stockfish",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[validate(length(min = 1, message = "gameId must not be empty"))]
    pub game_id: String,

    #[serde(default)]
    pub engine: EngineKind,

    #[serde(default)]
    pub force_analysis: bool,

    #[serde(default = "default_depth")]
    #[validate(range(min = 1, max = 245))]
    pub depth: u32,

    /// Milliseconds per position
    #[serde(default = "default_movetime")]
    #[validate(range(min = 1))]
    pub movetime: u32,

    #[serde(default = "default_multipv")]
    #[validate(range(min = 1, max = 500))]
    pub multipv: u32,

    #[serde(default = "default_skill_level")]
    #[validate(range(min = 0, max = 20))]
    pub skill_level: u32,

    #[serde(default = "default_threads")]
    #[validate(range(min = 1, max = 1024))]
    pub threads: u32,

    /// Transposition table size in MB
    #[serde(default = "default_hash")]
    #[validate(range(min = 1))]
    pub hash: u32,
}

fn default_depth() -> u32 {
    15
}

fn default_movetime() -> u32 {
    300
}

fn default_multipv() -> u32 {
    1
}

fn default_skill_level() -> u32 {
    20
}

fn default_threads() -> u32 {
    1
}

fn default_hash() -> u32 {
    256
}

impl AnalysisRequest {
    /// Request with every optional field at its default.
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            engine: EngineKind::default(),
            force_analysis: false,
            depth: default_depth(),
            movetime: default_movetime(),
            multipv: default_multipv(),
            skill_level: default_skill_level(),
            threads: default_threads(),
            hash: default_hash(),
        }
    }

    /// Consume the request, returning it only if every field is in range.
    pub fn validated(self) -> Result<Self, ValidationErrors> {
        self.validate()?;
        Ok(self)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            multipv: self.multipv,
            skill_level: self.skill_level,
            threads: self.threads,
            hash_mb: self.hash,
        }
    }

    pub fn search_limits(&self, timeout: Duration) -> SearchLimits {
        SearchLimits {
            depth: self.depth,
            movetime: Duration::from_millis(self.movetime.into()),
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let request: AnalysisRequest = serde_json::from_str(r#"{"gameId": "122374127732"}"#).unwrap();
        assert_eq!(request, AnalysisRequest::new("122374127732"));
        assert_eq!(request.engine, EngineKind::Stockfish);
        assert_eq!(request.depth, 15);
        assert_eq!(request.movetime, 300);
        assert_eq!(request.hash, 256);
        assert!(request.validated().is_ok());
    }

    #[test]
    fn test_camel_case_fields() {
        let request: AnalysisRequest = serde_json::from_str(
            r#"{"gameId": "g1", "forceAnalysis": true, "skillLevel": 5, "movetime": 400, "hash": 128}"#,
        )
        .unwrap();
        assert!(request.force_analysis);
        assert_eq!(request.skill_level, 5);
        assert_eq!(request.engine_options().hash_mb, 128);
        assert_eq!(
            request.search_limits(Duration::from_secs(4)).movetime,
            Duration::from_millis(400)
        );
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let result: Result<AnalysisRequest, _> =
            serde_json::from_str(r#"{"gameId": "g1", "engine": "komodo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_fields_reported() {
        let mut request = AnalysisRequest::new("g1");
        request.skill_level = 21;
        request.depth = 0;
        let errors = request.validated().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("skill_level"));
        assert!(fields.contains_key("depth"));
        assert!(!fields.contains_key("threads"));
    }

    #[test]
    fn test_empty_game_id_rejected() {
        assert!(AnalysisRequest::new("").validated().is_err());
    }
}
