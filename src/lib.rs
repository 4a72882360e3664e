// src/lib.rs
// Public library surface for the server binary, the debug tool and integration tests.

pub mod api;
pub mod availability;
pub mod canon;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod feedback;
pub mod matcher;
pub mod metrics;
pub mod normalize;
pub mod ranker;
pub mod substitution;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::MatcherConfig;
pub use crate::engine::{start_corpus_watch, Engine, IngredientInput, ReloadOutcome, Trace};
pub use crate::feedback::{FeedbackAction, FeedbackError, FeedbackStore};
pub use crate::matcher::{MatchResult, ScoringParams};
