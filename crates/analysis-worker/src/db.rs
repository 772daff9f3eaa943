//! Postgres repository for games and their analyses

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::AnalysisError;
use crate::quality::MoveQuality;
use crate::repository::{AnalysisResult, GameRecord, GameRepository};
use crate::score::Evaluation;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Run the schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Games imported from chess platforms
CREATE TABLE IF NOT EXISTS games (
    id            TEXT PRIMARY KEY,
    pgn           TEXT NOT NULL,
    white         TEXT NOT NULL,
    black         TEXT NOT NULL,
    white_rating  INTEGER,
    black_rating  INTEGER,
    date          TEXT,
    analysing     BOOLEAN NOT NULL DEFAULT FALSE,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Engine analysis, one row per game
CREATE TABLE IF NOT EXISTS game_analysis (
    game_id        TEXT PRIMARY KEY REFERENCES games(id) ON DELETE CASCADE,
    date           TIMESTAMPTZ NOT NULL,
    scores         TEXT[] NOT NULL,
    moves_quality  TEXT[] NOT NULL,
    variants       TEXT[] NOT NULL,
    engine         TEXT NOT NULL,
    depth          BIGINT NOT NULL,
    multipv        BIGINT NOT NULL,
    skill_level    BIGINT NOT NULL,
    move_time      BIGINT NOT NULL,
    threads        BIGINT NOT NULL
);
"#;

type AnalysisRow = (
    String,
    DateTime<Utc>,
    Vec<String>,
    Vec<String>,
    Vec<String>,
    String,
    i64,
    i64,
    i64,
    i64,
    i64,
);

#[derive(Clone, Debug)]
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl GameRepository for PgGameRepository {
    async fn fetch_game(&self, game_id: &str) -> Result<Option<GameRecord>, AnalysisError> {
        let row: Option<(String, String, String, String, Option<i32>, Option<i32>, Option<String>, bool)> =
            sqlx::query_as(
                "SELECT id, pgn, white, black, white_rating, black_rating, date, analysing
                 FROM games WHERE id = $1",
            )
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(
            |(id, pgn, white, black, white_rating, black_rating, date, analysing)| GameRecord {
                id,
                pgn,
                white,
                black,
                white_rating,
                black_rating,
                date,
                analysing,
            },
        ))
    }

    async fn fetch_analysis(&self, game_id: &str) -> Result<Option<AnalysisResult>, AnalysisError> {
        let row: Option<AnalysisRow> = sqlx::query_as(
            "SELECT game_id, date, scores, moves_quality, variants,
                    engine, depth, multipv, skill_level, move_time, threads
             FROM game_analysis WHERE game_id = $1",
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(analysis_from_row).transpose()
    }

    async fn upsert_analysis(&self, result: &AnalysisResult) -> Result<(), AnalysisError> {
        let scores: Vec<String> = result.scores.iter().map(Evaluation::to_string).collect();
        let qualities: Vec<String> = result
            .moves_quality
            .iter()
            .map(|q| q.as_str().to_string())
            .collect();

        sqlx::query(
            r#"INSERT INTO game_analysis (
                game_id, date, scores, moves_quality, variants,
                engine, depth, multipv, skill_level, move_time, threads
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (game_id) DO UPDATE SET
                date = EXCLUDED.date,
                scores = EXCLUDED.scores,
                moves_quality = EXCLUDED.moves_quality,
                variants = EXCLUDED.variants,
                engine = EXCLUDED.engine,
                depth = EXCLUDED.depth,
                multipv = EXCLUDED.multipv,
                skill_level = EXCLUDED.skill_level,
                move_time = EXCLUDED.move_time,
                threads = EXCLUDED.threads"#,
        )
        .bind(&result.game_id)
        .bind(result.date)
        .bind(&scores)
        .bind(&qualities)
        .bind(&result.variants)
        .bind(&result.engine)
        .bind(i64::from(result.depth))
        .bind(i64::from(result.multipv))
        .bind(i64::from(result.skill_level))
        .bind(i64::from(result.movetime))
        .bind(i64::from(result.threads))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_analysing(&self, game_id: &str, analysing: bool) -> Result<(), AnalysisError> {
        sqlx::query("UPDATE games SET analysing = $2 WHERE id = $1")
            .bind(game_id)
            .bind(analysing)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn analysis_from_row(row: AnalysisRow) -> Result<AnalysisResult, AnalysisError> {
    let (game_id, date, scores, qualities, variants, engine, depth, multipv, skill_level, movetime, threads) =
        row;

    let scores = scores
        .iter()
        .map(|s| s.parse::<Evaluation>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AnalysisError::Persistence(e.to_string()))?;
    let moves_quality = qualities
        .iter()
        .map(|s| s.parse::<MoveQuality>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(AnalysisError::Persistence)?;

    Ok(AnalysisResult {
        game_id,
        date,
        scores,
        moves_quality,
        variants,
        engine,
        depth: column_u32("depth", depth)?,
        multipv: column_u32("multipv", multipv)?,
        skill_level: column_u32("skill_level", skill_level)?,
        movetime: column_u32("move_time", movetime)?,
        threads: column_u32("threads", threads)?,
    })
}

fn column_u32(column: &str, value: i64) -> Result<u32, AnalysisError> {
    u32::try_from(value)
        .map_err(|_| AnalysisError::Persistence(format!("{column} out of range: {value}")))
}
