//! Analysis worker
//!
//! Analyzes stored games with a local Stockfish, one after another:
//! `analysis-worker --games 123,456 [--force]`.

use analysis_worker::config::WorkerConfig;
use analysis_worker::db::{self, PgGameRepository};
use analysis_worker::stockfish::StockfishLauncher;
use analysis_worker::{analyze_game, AnalysisOutcome, AnalysisRequest, GameRepository};
use tracing::{error, info};

/// Parse --games 123,456,789 from CLI args
fn parse_games(args: &[String]) -> Option<Vec<String>> {
    let idx = args.iter().position(|a| a == "--games")?;
    let ids: Vec<String> = args
        .get(idx + 1)?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(game_ids) = parse_games(&args) else {
        anyhow::bail!("usage: analysis-worker --games <id,id,...> [--force]");
    };
    let force = args.iter().any(|a| a == "--force");

    let config = WorkerConfig::load()?;
    let pool = db::create_pool(&config.database_url, 2).await?;
    db::run_migrations(&pool).await?;
    info!("Database connection pool established");

    let repo = PgGameRepository::new(pool);
    let launcher = StockfishLauncher::new(
        config.analysis.engine_dir.clone(),
        config.analysis.engine_init_timeout,
    );

    let mut analyzed = 0u32;
    let mut skipped = 0u32;
    let mut failed = 0u32;

    for game_id in &game_ids {
        let mut request = AnalysisRequest::new(game_id.as_str());
        request.force_analysis = force;

        match analyze_game(&launcher, &repo, &config.analysis, &request).await {
            Ok(AnalysisOutcome::Completed {
                plies_analyzed,
                total_plies,
            }) => {
                let stored = repo.fetch_analysis(game_id).await?;
                if let Some(result) = stored {
                    let quality: Vec<&str> =
                        result.moves_quality.iter().map(|q| q.as_str()).collect();
                    info!(game_id = %game_id, ?quality, "Stored analysis");
                }
                println!("{game_id}: analyzed {plies_analyzed}/{total_plies} plies");
                analyzed += 1;
            }
            Ok(AnalysisOutcome::SkippedExisting) => {
                println!("{game_id}: already analyzed, skipped");
                skipped += 1;
            }
            Err(e) => {
                error!(game_id = %game_id, error = %e, "Analysis failed");
                println!("{game_id}: ERROR {e}");
                failed += 1;
            }
        }
    }

    println!(
        "Results: {analyzed} analyzed, {skipped} skipped, {failed} failed out of {} games",
        game_ids.len()
    );
    Ok(())
}
