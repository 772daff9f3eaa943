use analysis_worker::AnalysisError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use validator::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Body that could not be read as an analysis request
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => invalid_request(json!(msg)),
            AppError::Validation(errors) => invalid_request(camel_case_keys(json!(errors))),
            AppError::NotFound(msg) => detail(StatusCode::NOT_FOUND, msg),
            AppError::Analysis(AnalysisError::GameNotFound(game_id)) => {
                tracing::info!(game_id = %game_id, "Game not found");
                detail(StatusCode::NOT_FOUND, "The game does not exist".to_string())
            }
            AppError::Analysis(e) => {
                tracing::error!("Analysis error: {e}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

fn invalid_request(errors: Value) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "Invalid request", "errors": errors })),
    )
        .into_response()
}

/// Field errors keyed the way the request body names its fields.
fn camel_case_keys(errors: Value) -> Value {
    match errors {
        Value::Object(fields) => fields
            .into_iter()
            .map(|(field, kinds)| (camel_case(&field), kinds))
            .collect(),
        other => other,
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// {"detail": "message"}, same shape as the rest of the API
fn detail(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}
