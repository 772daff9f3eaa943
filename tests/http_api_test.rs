//! Integration tests for the HTTP API, driven through the router in-process.

mod common;

use analysis_worker::config::AnalysisConfig;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use server::config::Config;
use tower::ServiceExt;

use common::*;

fn app(launcher: &ScriptedLauncher, repo: &InMemoryRepository) -> axum::Router {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        analysis: AnalysisConfig::default(),
    };
    server::app(launcher.clone(), repo.clone(), config)
}

async fn send(app: axum::Router, method: Method, path: &str, body: Option<&str>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post_analysis(app: axum::Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/analysis", Some(&body.to_string())).await
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(
        app(&ScriptedLauncher::default(), &InMemoryRepository::default()),
        Method::GET,
        "/health",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_analysis_then_skip() {
    let launcher = ScriptedLauncher::default();
    let repo = InMemoryRepository::with_game("122374127732", FOOLS_MATE);

    let (status, body) =
        post_analysis(app(&launcher, &repo), json!({ "gameId": "122374127732" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "analyzed");
    assert_eq!(body["plies_analyzed"], 4);
    assert_eq!(
        body["message"],
        "The game 122374127732 was analyzed successfully"
    );

    let (status, body) =
        post_analysis(app(&launcher, &repo), json!({ "gameId": "122374127732" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "skipped");
    assert_eq!(launcher.opens(), 1);
}

#[tokio::test]
async fn test_stored_analysis_is_readable() {
    let launcher = ScriptedLauncher::new([cp(30, &[]), cp(-45, &["e7e5"]), Step::NoMove]);
    let repo = InMemoryRepository::with_game("g1", FOOLS_MATE);

    let (status, body) = send(app(&launcher, &repo), Method::GET, "/api/games/g1/analysis", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());

    post_analysis(app(&launcher, &repo), json!({ "gameId": "g1", "depth": 12 })).await;

    let (status, body) = send(app(&launcher, &repo), Method::GET, "/api/games/g1/analysis", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gameId"], "g1");
    assert_eq!(body["scores"], json!(["-45 cp"]));
    assert_eq!(body["movesQuality"], json!(["excellent"]));
    assert_eq!(body["variants"], json!(["e5"]));
    assert_eq!(body["depth"], 12);
}

#[tokio::test]
async fn test_unknown_game_is_404() {
    let (status, body) = post_analysis(
        app(&ScriptedLauncher::default(), &InMemoryRepository::default()),
        json!({ "gameId": "nope" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "The game does not exist");
}

#[tokio::test]
async fn test_invalid_fields_are_400() {
    let launcher = ScriptedLauncher::default();
    let repo = InMemoryRepository::with_game("g1", FOOLS_MATE);

    let (status, body) = post_analysis(
        app(&launcher, &repo),
        json!({ "gameId": "g1", "skillLevel": 21, "multipv": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request");
    assert!(body["errors"].get("skillLevel").is_some());
    assert!(body["errors"].get("skill_level").is_none());
    assert!(body["errors"].get("multipv").is_some());
    assert_eq!(launcher.opens(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let launcher = ScriptedLauncher::default();
    let repo = InMemoryRepository::with_game("g1", FOOLS_MATE);

    for body in [
        r#"{"gameId": "g1", "engine": "komodo"}"#,
        r#"{"engine": "stockfish"}"#,
        "not json",
    ] {
        let (status, value) =
            send(app(&launcher, &repo), Method::POST, "/api/analysis", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(value["message"], "Invalid request");
        assert!(value["errors"].is_string());
    }
}

#[tokio::test]
async fn test_engine_failure_is_500() {
    let launcher = ScriptedLauncher::new([cp(30, &[]), Step::Crash]);
    let repo = InMemoryRepository::with_game("g1", FOOLS_MATE);

    let (status, body) = post_analysis(app(&launcher, &repo), json!({ "gameId": "g1" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("scripted engine"));
    assert!(!repo.analysing("g1"));
    assert!(repo.analysis("g1").is_none());
}

#[tokio::test]
async fn test_save_failure_is_500() {
    let launcher = ScriptedLauncher::default();
    let repo = InMemoryRepository::with_game("g1", FOOLS_MATE);
    repo.fail_upsert();

    let (status, body) = post_analysis(app(&launcher, &repo), json!({ "gameId": "g1" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().starts_with("Persistence error"));
    assert_eq!(launcher.closes(), launcher.opens());
    assert_eq!(repo.flag_history(), vec![true, false]);
    assert!(repo.analysis("g1").is_none());
}
