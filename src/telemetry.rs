// src/telemetry.rs
//! Tracing setup and the dev-only, anonymized recommendation log.

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "pantry_match=info,warn";

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

const DEV_ENVS: &[&str] = &["local", "development", "dev"];

/// Debug builds always count as dev; release builds only when `SHUTTLE_ENV`
/// names a dev environment.
pub fn is_dev_env() -> bool {
    cfg!(debug_assertions)
        || std::env::var("SHUTTLE_ENV")
            .is_ok_and(|env| DEV_ENVS.iter().any(|d| env.eq_ignore_ascii_case(d)))
}

fn dev_logging_enabled() -> bool {
    std::env::var("MATCHER_DEV_LOG").is_ok_and(|v| v == "1") && is_dev_env()
}

const REQUEST_TAG_BYTES: usize = 6;
const LOGGED_TOP_IDS: usize = 5;

/// Hex tag derived from the user's phrases. Equal input gives an equal tag,
/// so repeated requests line up in the log while the text itself stays out.
pub(crate) fn request_tag(text: &str) -> String {
    use sha2::{Digest, Sha256};
    Sha256::digest(text.as_bytes())[..REQUEST_TAG_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// One dev log line per recommendation pass: request tag, counts and the
/// first few recipe ids.
pub(crate) fn dev_log_recommendation(
    phrases: &[&str],
    user_tokens: usize,
    cookable: usize,
    top_ids: &[&str],
) {
    if !dev_logging_enabled() {
        return;
    }
    let tag = request_tag(&phrases.join(","));
    let top = &top_ids[..top_ids.len().min(LOGGED_TOP_IDS)];
    info!(target: "recommend", %tag, user_tokens, cookable, ?top, "recommendation served");
}
