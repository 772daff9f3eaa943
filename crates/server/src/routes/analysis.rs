use analysis_worker::engine::EngineLauncher;
use analysis_worker::{analyze_game, AnalysisOutcome, AnalysisRequest, AnalysisResult, GameRepository};
use axum::extract::rejection::JsonRejection;
use axum::{extract::Path, Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::config::Config;
use crate::error::AppError;

/// POST /api/analysis
///
/// Runs the whole analysis before answering.
pub async fn request_analysis<L, R>(
    Extension(launcher): Extension<L>,
    Extension(repo): Extension<R>,
    Extension(config): Extension<Config>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<JsonValue>, AppError>
where
    L: EngineLauncher + Clone + 'static,
    R: GameRepository + Clone + 'static,
{
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let request = request.validated()?;

    let outcome = analyze_game(&launcher, &repo, &config.analysis, &request).await?;

    let body = match outcome {
        AnalysisOutcome::Completed {
            plies_analyzed,
            total_plies,
        } => json!({
            "message": format!("The game {} was analyzed successfully", request.game_id),
            "game_id": request.game_id,
            "status": "analyzed",
            "plies_analyzed": plies_analyzed,
            "total_plies": total_plies,
        }),
        AnalysisOutcome::SkippedExisting => json!({
            "message": format!("The game {} was already analyzed", request.game_id),
            "game_id": request.game_id,
            "status": "skipped",
        }),
    };
    Ok(Json(body))
}

/// GET /api/games/{game_id}/analysis
pub async fn get_game_analysis<R>(
    Extension(repo): Extension<R>,
    Path(game_id): Path<String>,
) -> Result<Json<AnalysisResult>, AppError>
where
    R: GameRepository + Clone + 'static,
{
    repo.fetch_game(&game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("The game does not exist".into()))?;

    let result = repo
        .fetch_analysis(&game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("The game has not been analyzed".into()))?;
    Ok(Json(result))
}
