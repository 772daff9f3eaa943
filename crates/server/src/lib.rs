pub mod config;
pub mod error;
pub mod routes;

use analysis_worker::engine::EngineLauncher;
use analysis_worker::GameRepository;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// Build the HTTP router over an engine launcher and a game repository.
pub fn app<L, R>(launcher: L, repo: R, config: Config) -> Router
where
    L: EngineLauncher + Clone + 'static,
    R: GameRepository + Clone + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/analysis", post(routes::analysis::request_analysis::<L, R>))
        .route(
            "/api/games/{game_id}/analysis",
            get(routes::analysis::get_game_analysis::<R>),
        )
        // Shared state
        .layer(Extension(launcher))
        .layer(Extension(repo))
        .layer(Extension(config))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
