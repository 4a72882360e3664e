// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /recommend  (string + list input, display cut-off, empty input)
// - POST /feedback   (success, bad action, missing id, id outside corpus)
// - GET /suggestions, GET /debug/trace
// - POST /admin/reload (corpus and weight file)

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tempfile::TempDir;
use tower::ServiceExt as _; // for `oneshot`

use pantry_match::api::{self, AppState};
use pantry_match::{Engine, MatcherConfig};

const BODY_LIMIT: usize = 1024 * 1024;

fn corpus() -> Vec<Json> {
    vec![
        json!({"id": 1, "name": "Chicken Rice", "ingredients": ["chicken", "rice", "salt"], "steps": ["Cook."]}),
        json!({"id": 2, "name": "Brine", "ingredients": ["salt", "water"]}),
        json!({"id": "dal-1", "name": "Dal", "ingredients": ["lentils", "turmeric", "tomatoes"]}),
    ]
}

/// Build the same Router the binary uses, over a throwaway data dir.
fn test_router(dir: &TempDir) -> Router {
    let mut cfg = MatcherConfig::default_seed();
    cfg.paths.recipes = dir.path().join("recipes.json");
    cfg.paths.weights = dir.path().join("weights.json");
    api::create_router(AppState::new(Engine::load(corpus(), cfg)))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let dir = TempDir::new().unwrap();
    let resp = test_router(&dir)
        .oneshot(get("/health"))
        .await
        .expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap().trim(), "OK");
}

#[tokio::test]
async fn recommend_accepts_string_input() {
    let dir = TempDir::new().unwrap();
    let (status, v) = send(
        test_router(&dir),
        post_json("/recommend", json!({ "ingredients": "Chicken, 1 cup rice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ingredients"], json!(["Chicken", "1 cup rice"]));

    let recipes = v["recipes"].as_array().expect("recipes array");
    assert_eq!(v["count"].as_u64(), Some(recipes.len() as u64));
    assert_eq!(recipes[0]["id"], "1");
    assert_eq!(recipes[0]["cookable"], true);
    assert_eq!(recipes[0]["warning"], "");
    // internal relevance flag stays off the wire
    assert!(recipes[0].get("relevant").is_none());
}

#[tokio::test]
async fn recommend_filters_low_scores_for_display() {
    let dir = TempDir::new().unwrap();
    let (status, v) = send(
        test_router(&dir),
        post_json("/recommend", json!({ "ingredients": ["chicken", "rice"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = v["recipes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    // Brine only overlaps on pantry staples and scores below the cut-off.
    assert_eq!(ids, vec!["1"]);
    assert!(v["recipes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["score"].as_u64().unwrap() >= 10));
}

#[tokio::test]
async fn recommend_rejects_empty_input() {
    let dir = TempDir::new().unwrap();
    for payload in [json!({ "ingredients": " , " }), json!({ "ingredients": [] }), json!({})] {
        let (status, v) = send(test_router(&dir), post_json("/recommend", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["status"], "error");
    }
}

#[tokio::test]
async fn feedback_success_and_validation() {
    let dir = TempDir::new().unwrap();
    let app = test_router(&dir);

    let (status, v) = send(
        app.clone(),
        post_json("/feedback", json!({ "recipe_id": 1, "action": "select" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "success");
    assert!((v["weight"].as_f64().unwrap() - 1.1).abs() < 1e-9);
    assert!(dir.path().join("weights.json").exists());

    let (status, v) = send(
        app.clone(),
        post_json("/feedback", json!({ "recipe_id": "dal-1", "action": "love" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["status"], "error");
    assert!(v["message"].as_str().unwrap().contains("love"));

    let (status, _) = send(app, post_json("/feedback", json!({ "action": "reject" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feedback_for_unknown_recipe_is_400_and_not_stored() {
    let dir = TempDir::new().unwrap();
    let app = test_router(&dir);

    for id in [json!(404), json!("no-such-recipe")] {
        let (status, v) = send(
            app.clone(),
            post_json("/feedback", json!({ "recipe_id": id, "action": "select" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["status"], "error");
        assert!(v["message"].as_str().unwrap().contains("unknown recipe"));
    }
    assert!(!dir.path().join("weights.json").exists());

    // string ids from the corpus still go through
    let (status, _) = send(
        app,
        post_json("/feedback", json!({ "recipe_id": "dal-1", "action": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn feedback_persist_failure_is_500() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x").unwrap();
    let mut cfg = MatcherConfig::default_seed();
    cfg.paths.weights = blocker.join("weights.json");
    let app = api::create_router(AppState::new(Engine::load(corpus(), cfg)));

    let (status, v) = send(
        app,
        post_json("/feedback", json!({ "recipe_id": 1, "action": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["status"], "error");
}

#[tokio::test]
async fn suggestions_and_trace() {
    let dir = TempDir::new().unwrap();
    let app = test_router(&dir);

    let (status, v) = send(app.clone(), get("/suggestions?q=TOMA")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!(["tomato", "tomatoes"]));

    let (status, v) = send(app, get("/debug/trace?ingredients=1%2F2%20Chicken,%202%20cups")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["phrases"][0]["normalized"], "chicken");
    assert_eq!(v["phrases"][1]["canonical"], Json::Null);
    assert_eq!(v["user"], json!(["chicken"]));
}

#[tokio::test]
async fn admin_reload_reports_outcome() {
    let dir = TempDir::new().unwrap();
    let app = test_router(&dir);

    // no corpus file in the data dir yet
    let (status, v) = send(app.clone(), post_json("/admin/reload", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "failed");
    assert_eq!(v["weights"], "missing");

    std::fs::write(
        dir.path().join("recipes.json"),
        json!([{ "id": 5, "name": "Toast", "ingredients": ["bread"] }]).to_string(),
    )
    .unwrap();
    let (_, v) = send(app.clone(), post_json("/admin/reload", json!({}))).await;
    assert_eq!(
        v,
        json!({ "status": "loaded", "recipes": 1, "skipped": 0, "weights": "missing" })
    );

    let (_, v) = send(app.clone(), post_json("/recommend", json!({ "ingredients": "bread" }))).await;
    assert_eq!(v["recipes"][0]["id"], "5");
    let full = v["recipes"][0]["score"].as_u64().unwrap();

    // a weight file dropped in by hand is picked up by the same call
    std::fs::write(dir.path().join("weights.json"), r#"{"5": 0.5}"#).unwrap();
    let (_, v) = send(app.clone(), post_json("/admin/reload", json!({}))).await;
    assert_eq!(v["weights"], "loaded");
    let (_, v) = send(app.clone(), post_json("/recommend", json!({ "ingredients": "bread" }))).await;
    assert!(v["recipes"][0]["score"].as_u64().unwrap() < full);

    // a corrupt file keeps the weights already in memory
    std::fs::write(dir.path().join("weights.json"), "{not json").unwrap();
    let (_, v) = send(app.clone(), post_json("/admin/reload", json!({}))).await;
    assert_eq!(v["weights"], "corrupt");
    let (_, after) = send(app, post_json("/recommend", json!({ "ingredients": "bread" }))).await;
    assert!(after["recipes"][0]["score"].as_u64().unwrap() < full);
}
