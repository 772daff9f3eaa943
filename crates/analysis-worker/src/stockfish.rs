//! Stockfish engine session over UCI (async process I/O)

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::engine::{CandidateLine, EngineLauncher, EngineOptions, EngineSession, SearchLimits};
use crate::error::AnalysisError;
use crate::score::Evaluation;

/// How long `close` waits for the engine to exit after `quit`
const QUIT_GRACE: Duration = Duration::from_secs(1);

/// Spawns engine binaries found in a directory.
#[derive(Clone, Debug)]
pub struct StockfishLauncher {
    engine_dir: PathBuf,
    init_timeout: Duration,
}

impl StockfishLauncher {
    pub fn new(engine_dir: impl Into<PathBuf>, init_timeout: Duration) -> Self {
        Self {
            engine_dir: engine_dir.into(),
            init_timeout,
        }
    }

    pub fn binary_path(&self, engine: &str) -> PathBuf {
        self.engine_dir.join(engine)
    }
}

impl EngineLauncher for StockfishLauncher {
    type Session = StockfishEngine;

    async fn open(
        &self,
        engine: &str,
        options: &EngineOptions,
    ) -> Result<StockfishEngine, AnalysisError> {
        let path = self.binary_path(engine);
        StockfishEngine::spawn(&path, options, self.init_timeout).await
    }
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    name: String,
    closed: bool,
}

impl StockfishEngine {
    /// Spawn the engine, run the UCI handshake and apply `options`.
    pub async fn spawn(
        path: &Path,
        options: &EngineOptions,
        init_timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AnalysisError::EngineUnavailable(format!(
                    "Failed to spawn {}: {e}",
                    path.display()
                ))
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnalysisError::EngineUnavailable("engine stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| AnalysisError::EngineUnavailable("engine stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            name: path.display().to_string(),
            closed: false,
        };

        let handshake = tokio::time::timeout(init_timeout, engine.handshake(options)).await;
        match handshake {
            Ok(Ok(())) => Ok(engine),
            Ok(Err(e)) => {
                engine.close().await;
                Err(e)
            }
            Err(_) => {
                engine.close().await;
                Err(AnalysisError::EngineUnavailable(format!(
                    "{} did not complete the UCI handshake within {init_timeout:?}",
                    path.display()
                )))
            }
        }
    }

    async fn handshake(&mut self, options: &EngineOptions) -> Result<(), AnalysisError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        self.send(&format!("setoption name MultiPV value {}", options.multipv))
            .await?;
        self.send(&format!(
            "setoption name Skill Level value {}",
            options.skill_level
        ))
        .await?;
        self.send(&format!("setoption name Threads value {}", options.threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", options.hash_mb))
            .await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;

        debug!(engine = %self.name, "Engine ready");
        Ok(())
    }

    /// Send a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), AnalysisError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| AnalysisError::EngineUnavailable(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AnalysisError::EngineUnavailable(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line; end of stream means the process went away.
    async fn read_line(&mut self) -> Result<String, AnalysisError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| AnalysisError::EngineUnavailable(format!("Failed to read from engine: {e}")))?;
        if read == 0 {
            return Err(AnalysisError::EngineUnavailable(format!(
                "{} exited unexpectedly",
                self.name
            )));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), AnalysisError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Collect the latest line per multi-PV slot until `bestmove`.
    async fn read_search(&mut self) -> Result<Option<Vec<CandidateLine>>, AnalysisError> {
        let mut slots: Vec<Option<CandidateLine>> = Vec::new();

        loop {
            let line = self.read_line().await?;

            if line.starts_with("info") && line.contains(" pv ") {
                let Some(evaluation) = parse_score(&line) else {
                    continue;
                };
                let idx = parse_multipv_index(&line).unwrap_or(1).max(1) as usize - 1;
                if slots.len() <= idx {
                    slots.resize(idx + 1, None);
                }
                slots[idx] = Some(CandidateLine::new(evaluation, parse_pv(&line)));
            } else if line.starts_with("bestmove") {
                let best = line.split_whitespace().nth(1);
                if matches!(best, None | Some("(none)")) {
                    return Ok(None);
                }
                let lines: Vec<CandidateLine> = slots.into_iter().flatten().collect();
                if lines.is_empty() {
                    warn!(engine = %self.name, bestmove = ?best, "Search ended without a scored line");
                    return Ok(None);
                }
                return Ok(Some(lines));
            }
        }
    }
}

impl EngineSession for StockfishEngine {
    async fn evaluate(
        &mut self,
        fen: &str,
        limits: &SearchLimits,
    ) -> Result<Option<Vec<CandidateLine>>, AnalysisError> {
        if self.closed {
            return Err(AnalysisError::EngineUnavailable(format!(
                "{} is already closed",
                self.name
            )));
        }

        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!(
            "go depth {} movetime {}",
            limits.depth,
            limits.movetime.as_millis()
        ))
        .await?;

        let search = tokio::time::timeout(limits.timeout, self.read_search()).await;
        match search {
            Ok(result) => result,
            Err(_) => {
                warn!(engine = %self.name, timeout = ?limits.timeout, "Engine search timed out, killing process");
                let _ = self.process.start_kill();
                Err(AnalysisError::EngineTimeout(limits.timeout))
            }
        }
    }

    /// Send quit and wait for the process to exit
    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let _ = self.send("quit").await;
        match tokio::time::timeout(QUIT_GRACE, self.process.wait()).await {
            Ok(_) => debug!(engine = %self.name, "Engine exited"),
            Err(_) => {
                let _ = self.process.start_kill();
                let _ = self.process.wait().await;
            }
        }
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        if !self.closed {
            // Best-effort synchronous kill in drop
            let _ = self.process.start_kill();
        }
    }
}

/// Parse `score cp N` / `score mate N` from an info line
fn parse_score(line: &str) -> Option<Evaluation> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let idx = parts.iter().position(|p| *p == "score")?;
    let value: i32 = parts.get(idx + 2)?.parse().ok()?;
    match *parts.get(idx + 1)? {
        "cp" => Some(Evaluation::centipawns(value)),
        "mate" => Some(Evaluation::mate(value)),
        _ => None,
    }
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "multipv" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}
