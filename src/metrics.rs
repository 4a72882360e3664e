// src/metrics.rs
use axum::{extract::State, routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "recommend_requests_total",
            "Recommendation passes over the corpus."
        );
        describe_histogram!(
            "recommend_results",
            "Recipes returned per recommendation pass."
        );
        describe_counter!(
            "feedback_events_total",
            "Accepted select/reject feedback events."
        );
        describe_counter!(
            "corpus_reloads_total",
            "Corpus reload attempts, by outcome."
        );
        describe_gauge!("corpus_recipes", "Recipes in the active corpus snapshot.");
    });
}

impl Metrics {
    /// Install the Prometheus recorder. Fails if another recorder is already set.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format, ready to merge into the app router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(render))
            .with_state(self.handle.clone())
    }
}

async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
