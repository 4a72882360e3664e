// tests/e2e_smoke.rs
//
// Boots the router from the repository's own config and sample corpus.

use pantry_match::api::{self, AppState};
use pantry_match::config::matcher::ENV_MATCHER_CONFIG_PATH;
use pantry_match::{Engine, MatcherConfig};
use serial_test::serial;
use shuttle_axum::axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt; // for `oneshot` (tower 0.5 with features=["util"])

fn repo_router() -> Router {
    std::env::set_var(ENV_MATCHER_CONFIG_PATH, "config/matcher.toml");
    let mut cfg = MatcherConfig::from_toml().expect("load matcher config for tests");
    // never write feedback into the repository
    let tmp = std::env::temp_dir().join(format!("pantry-match-smoke-{}.json", std::process::id()));
    cfg.paths.weights = tmp;
    api::create_router(AppState::new(Engine::from_config(cfg)))
}

#[tokio::test]
#[serial]
async fn smoke_recommend_from_sample_corpus() {
    let app = repo_router();

    let req = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"ingredients":"1/2 Chicken, Basmati rice"}"#))
        .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["recipes"][0]["name"], "Chicken Rice");
    assert_eq!(v["recipes"][0]["cookable"], true);
}

#[tokio::test]
#[serial]
async fn smoke_regional_names_match() {
    let app = repo_router();

    let req = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"ingredients":["eggplant","tomato","chili"]}"#))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let first = &v["recipes"][0];
    assert_eq!(first["name"], "Baingan Bharta");
    assert_eq!(first["cookable"], true);
}
