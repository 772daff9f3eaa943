use analysis_worker::db::{self, PgGameRepository};
use analysis_worker::stockfish::StockfishLauncher;
use server::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, 10).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    let launcher = StockfishLauncher::new(
        config.analysis.engine_dir.clone(),
        config.analysis.engine_init_timeout,
    );
    tracing::info!(engine_dir = %config.analysis.engine_dir.display(), "Engine launcher ready");

    let addr = format!("{}:{}", config.host, config.port);
    let app = server::app(launcher, PgGameRepository::new(pool), config);

    tracing::info!("Starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
