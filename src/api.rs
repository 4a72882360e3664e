// src/api.rs
//! HTTP surface over the shared `Engine`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::corpus::id_key;
use crate::engine::{Engine, IngredientInput, Trace, DEFAULT_SUGGESTION_LIMIT};
use crate::feedback::{FeedbackAction, FeedbackError};
use crate::matcher::MatchResult;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/recommend", post(recommend))
        .route("/feedback", post(feedback))
        .route("/suggestions", get(suggestions))
        .route("/debug/trace", get(debug_trace))
        .route("/admin/reload", post(admin_reload))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "status": "error", "message": message.into() })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct RecommendReq {
    #[serde(default)]
    ingredients: IngredientInput,
    #[serde(default)]
    top_n: Option<usize>,
}

#[derive(Serialize)]
struct RecommendResp {
    ingredients: Vec<String>,
    count: usize,
    recipes: Vec<MatchResult>,
}

async fn recommend(State(state): State<AppState>, Json(body): Json<RecommendReq>) -> Response {
    if body.ingredients.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no ingredients provided");
    }
    let phrases: Vec<String> = body
        .ingredients
        .phrases()
        .into_iter()
        .map(str::to_string)
        .collect();

    let ranking = &state.engine.config().ranking;
    let top_n = body
        .top_n
        .filter(|n| *n > 0)
        .unwrap_or(ranking.default_top_n);
    let min_score = ranking.min_display_score;

    let recipes: Vec<MatchResult> = state
        .engine
        .recommend(phrases.clone(), top_n)
        .into_iter()
        .filter(|r| r.score >= min_score)
        .collect();

    Json(RecommendResp {
        ingredients: phrases,
        count: recipes.len(),
        recipes,
    })
    .into_response()
}

#[derive(Deserialize)]
struct FeedbackReq {
    #[serde(default)]
    recipe_id: serde_json::Value,
    #[serde(default)]
    action: String,
}

async fn feedback(State(state): State<AppState>, Json(body): Json<FeedbackReq>) -> Response {
    let parsed = id_key(&body.recipe_id)
        .ok_or(FeedbackError::MissingRecipeId)
        .and_then(|id| Ok((id, body.action.parse::<FeedbackAction>()?)));
    let (id, action) = match parsed {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    // the weight file is rewritten on every event; keep that off the async workers
    let engine = Arc::clone(&state.engine);
    let result = match tokio::task::spawn_blocking(move || engine.record_feedback(&id, action)).await {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    match result {
        Ok(weight) => Json(json!({ "status": "success", "weight": weight })).into_response(),
        Err(e) if e.is_invalid_input() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[derive(Deserialize)]
struct SuggestQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    limit: Option<usize>,
}

async fn suggestions(
    State(state): State<AppState>,
    Query(q): Query<SuggestQuery>,
) -> Json<Vec<String>> {
    let limit = q.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);
    Json(state.engine.suggest(&q.q, limit))
}

#[derive(Deserialize)]
struct TraceQuery {
    #[serde(default)]
    ingredients: String,
}

async fn debug_trace(State(state): State<AppState>, Query(q): Query<TraceQuery>) -> Json<Trace> {
    Json(state.engine.trace(q.ingredients))
}

/// Re-read the corpus and the weight file. Either one failing keeps its
/// current state; the body reports both outcomes.
async fn admin_reload(State(state): State<AppState>) -> Response {
    let engine = Arc::clone(&state.engine);
    let reloaded =
        tokio::task::spawn_blocking(move || (engine.reload_configured(), engine.reload_weights()))
            .await;
    let (corpus, weights) = match reloaded {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut body = serde_json::to_value(&corpus).unwrap_or_else(|_| json!({}));
    if let Some(obj) = body.as_object_mut() {
        obj.insert("weights".into(), json!(weights.as_str()));
    }
    Json(body).into_response()
}
