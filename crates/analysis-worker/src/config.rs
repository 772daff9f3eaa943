//! Analysis configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::AnalysisError;

/// Knobs for engine supervision and run deadlines.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Directory holding engine binaries, looked up by engine name
    pub engine_dir: PathBuf,

    /// Budget for the UCI handshake and option setup
    pub engine_init_timeout: Duration,

    /// A search may take up to `movetime * engine_timeout_factor`
    pub engine_timeout_factor: u32,

    /// Floor for the per-search timeout (depth-bound searches ignore movetime)
    pub engine_min_timeout: Duration,

    /// Overall budget for one game, engine and database round-trips included
    pub run_timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            engine_dir: PathBuf::from("bin"),
            engine_init_timeout: Duration::from_secs(10),
            engine_timeout_factor: 10,
            engine_min_timeout: Duration::from_millis(5000),
            run_timeout: Duration::from_secs(1800),
        }
    }
}

impl AnalysisConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            engine_dir: env::var("ENGINE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.engine_dir),
            engine_init_timeout: env_parse("ENGINE_INIT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.engine_init_timeout),
            engine_timeout_factor: env_parse("ENGINE_TIMEOUT_FACTOR")
                .unwrap_or(defaults.engine_timeout_factor),
            engine_min_timeout: env_parse("ENGINE_MIN_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.engine_min_timeout),
            run_timeout: env_parse("RUN_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.run_timeout),
        }
    }

    /// Per-search timeout for a given movetime.
    pub fn search_timeout(&self, movetime: Duration) -> Duration {
        (movetime * self.engine_timeout_factor).max(self.engine_min_timeout)
    }
}

/// Configuration of the standalone worker binary.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Database connection URL
    pub database_url: String,

    pub analysis: AnalysisConfig,
}

impl WorkerConfig {
    pub fn load() -> Result<Self, AnalysisError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| AnalysisError::Config("DATABASE_URL not set"))?;
        let analysis = AnalysisConfig::from_env();
        info!(engine_dir = %analysis.engine_dir.display(), "Analysis config loaded");

        Ok(Self {
            database_url,
            analysis,
        })
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_timeout_scales_with_movetime() {
        let config = AnalysisConfig::default();
        assert_eq!(
            config.search_timeout(Duration::from_millis(300)),
            Duration::from_millis(5000)
        );
        assert_eq!(
            config.search_timeout(Duration::from_millis(2000)),
            Duration::from_millis(20_000)
        );
    }
}
