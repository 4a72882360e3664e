//! Pantry-Match Service: binary entrypoint
//! Boots the Axum HTTP server: config, corpus + weights, optional corpus
//! watcher, metrics and routes.

use std::sync::Arc;

use pantry_match::{
    api::{self, AppState},
    metrics::Metrics,
    start_corpus_watch,
    telemetry::init_tracing,
    Engine, MatcherConfig,
};
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = MatcherConfig::from_toml()?;
    let corpus_path = config.paths.recipes.clone();
    let engine = Arc::new(Engine::from_config(config));
    info!(recipes = engine.recipe_count(), "engine ready");

    // If hot reload is enabled, spawn background watcher
    start_corpus_watch(engine.clone(), corpus_path);

    let state = AppState { engine };
    let mut router = api::create_router(state);

    match Metrics::init() {
        Ok(metrics) => router = router.merge(metrics.router()),
        Err(e) => warn!(error = %e, "metrics disabled"),
    }

    Ok(router.into())
}
