// src/engine.rs
//! # Recommendation Engine
//! Explicitly owned engine instance: corpus snapshot + canonicalization map +
//! feedback store. Constructed once at startup and shared by handle.
//!
//! The corpus, its canonicalization map, the canonical pantry set and the
//! canonical substitution table live together in one immutable `Snapshot`.
//! A request clones the `Arc` and scores without holding any lock; a reload
//! builds a fresh snapshot and swaps it in a single write, so a scoring pass
//! never observes a half-updated corpus.

use metrics::{counter, gauge, histogram};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::availability::{canonical_set, compute_availability};
use crate::canon::CanonicalMap;
use crate::config::MatcherConfig;
use crate::corpus::{load_corpus, recipes_from_values, CorpusLoad, Recipe};
use crate::feedback::{FeedbackAction, FeedbackError, FeedbackStore, WeightsLoad, DEFAULT_WEIGHT};
use crate::matcher::{MatchResult, Matcher};
use crate::normalize::{normalize, split_input};
use crate::ranker::rank;
use crate::substitution::SubstitutionTable;
use crate::telemetry::{dev_log_recommendation, is_dev_env};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Raw user ingredients: one comma-separated string or an already split list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IngredientInput {
    Text(String),
    List(Vec<String>),
}

impl IngredientInput {
    /// Trimmed, non-empty phrases in input order.
    pub fn phrases(&self) -> Vec<&str> {
        match self {
            IngredientInput::Text(s) => split_input(s),
            IngredientInput::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases().is_empty()
    }
}

impl Default for IngredientInput {
    fn default() -> Self {
        IngredientInput::List(Vec::new())
    }
}

impl From<&str> for IngredientInput {
    fn from(s: &str) -> Self {
        IngredientInput::Text(s.to_string())
    }
}

impl From<String> for IngredientInput {
    fn from(s: String) -> Self {
        IngredientInput::Text(s)
    }
}

impl From<Vec<String>> for IngredientInput {
    fn from(v: Vec<String>) -> Self {
        IngredientInput::List(v)
    }
}

impl From<Vec<&str>> for IngredientInput {
    fn from(v: Vec<&str>) -> Self {
        IngredientInput::List(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for IngredientInput {
    fn from(v: &[&str]) -> Self {
        IngredientInput::List(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Everything a scoring pass reads, built together and swapped together.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub recipes: Vec<Recipe>,
    pub canon: CanonicalMap,
    pub pantry: HashSet<String>,
    pub substitutions: SubstitutionTable,
}

impl Snapshot {
    pub fn build(recipes: Vec<Recipe>, pantry_items: &[String], table: &SubstitutionTable) -> Self {
        let canon = CanonicalMap::build(&recipes);
        let pantry = canonical_set(pantry_items, &canon);
        let substitutions = table.canonicalized(&canon);
        Self {
            recipes,
            canon,
            pantry,
            substitutions,
        }
    }
}

/// Reload result as reported to callers and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReloadOutcome {
    Loaded { recipes: usize, skipped: usize },
    Failed { reason: String },
}

/// One input phrase through the normalization pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhraseTrace {
    pub raw: String,
    pub normalized: String,
    pub canonical: Option<String>,
}

/// Explains how an input was turned into the availability set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub phrases: Vec<PhraseTrace>,
    pub user: Vec<String>,
    pub pantry: Vec<String>,
    pub available: Vec<String>,
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut v: Vec<String> = set.iter().cloned().collect();
    v.sort();
    v
}

pub struct Engine {
    config: MatcherConfig,
    snapshot: RwLock<Arc<Snapshot>>,
    feedback: FeedbackStore,
}

impl Engine {
    /// Build from already-converted recipes and an explicit feedback store.
    pub fn new(recipes: Vec<Recipe>, config: MatcherConfig, feedback: FeedbackStore) -> Self {
        let snapshot = Snapshot::build(recipes, &config.pantry.items, &config.substitutions);
        info!(
            recipes = snapshot.recipes.len(),
            terms = snapshot.canon.len(),
            pantry = snapshot.pantry.len(),
            "engine initialized"
        );
        gauge!("corpus_recipes").set(snapshot.recipes.len() as f64);
        Self {
            config,
            snapshot: RwLock::new(Arc::new(snapshot)),
            feedback,
        }
    }

    /// Build from raw corpus records, loading persisted weights from the
    /// configured path. Malformed records are skipped.
    pub fn load(records: Vec<serde_json::Value>, config: MatcherConfig) -> Self {
        let (recipes, skipped) = recipes_from_values(records);
        if skipped > 0 {
            warn!(skipped, "corpus contained malformed records");
        }
        let feedback = FeedbackStore::open(config.paths.weights.clone());
        Self::new(recipes, config, feedback)
    }

    /// Read corpus and weights from the configured paths. A corpus that
    /// cannot be loaded leaves the engine empty rather than failing.
    pub fn from_config(config: MatcherConfig) -> Self {
        let recipes = match load_corpus(&config.paths.recipes) {
            CorpusLoad::Loaded { recipes, skipped } => {
                info!(
                    path = %config.paths.recipes.display(),
                    recipes = recipes.len(),
                    skipped,
                    "corpus loaded"
                );
                recipes
            }
            CorpusLoad::LoadFailed { reason } => {
                warn!(%reason, "corpus load failed, serving an empty corpus");
                Vec::new()
            }
        };
        let feedback = FeedbackStore::open(config.paths.weights.clone());
        Self::new(recipes, config, feedback)
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Current snapshot handle. Cheap; holds no lock once returned.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn recipe_count(&self) -> usize {
        self.snapshot().recipes.len()
    }

    pub fn weight(&self, recipe_id: &str) -> f64 {
        self.feedback.weight(recipe_id)
    }

    /// Rank the corpus against `input`. All cookable recipes are returned,
    /// followed by at most `top_n` near-misses.
    pub fn recommend(&self, input: impl Into<IngredientInput>, top_n: usize) -> Vec<MatchResult> {
        let input = input.into();
        let phrases = input.phrases();
        let snap = self.snapshot();
        if snap.recipes.is_empty() {
            return Vec::new();
        }

        let av = compute_availability(phrases.iter().copied(), &snap.pantry, &snap.canon);
        let weights = self.feedback.snapshot();
        let matcher = Matcher::new(&snap.canon, &snap.substitutions, &self.config.scoring);

        let scored: Vec<MatchResult> = snap
            .recipes
            .iter()
            .filter_map(|r| {
                let w = weights.get(&r.id).copied().unwrap_or(DEFAULT_WEIGHT);
                matcher.score(r, &av, w)
            })
            .collect();

        let ranked = rank(scored, top_n);
        let cookable = ranked.iter().filter(|r| r.cookable).count();

        counter!("recommend_requests_total").increment(1);
        histogram!("recommend_results").record(ranked.len() as f64);
        debug!(
            user_tokens = av.user.len(),
            results = ranked.len(),
            cookable,
            "recommendation pass"
        );
        let top_ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        dev_log_recommendation(&phrases, av.user.len(), cookable, &top_ids);

        ranked
    }

    /// Apply a feedback event to a recipe of the current corpus. Ids outside
    /// the corpus are refused so the weight table only holds real recipes.
    pub fn record_feedback(
        &self,
        recipe_id: &str,
        action: FeedbackAction,
    ) -> Result<f64, FeedbackError> {
        let id = recipe_id.trim();
        let result = if !id.is_empty() && !self.snapshot().recipes.iter().any(|r| r.id == id) {
            Err(FeedbackError::UnknownRecipe(id.to_string()))
        } else {
            self.feedback.record(id, action)
        };
        match &result {
            Ok(w) => {
                counter!("feedback_events_total", "action" => action.as_str()).increment(1);
                info!(recipe_id, action = action.as_str(), weight = *w, "feedback recorded");
            }
            Err(e) => warn!(recipe_id, error = %e, "feedback not recorded"),
        }
        result
    }

    /// Swap in already-converted recipes atomically. Learned weights are
    /// kept as they are.
    pub fn install(&self, recipes: Vec<Recipe>) {
        let snapshot = Snapshot::build(recipes, &self.config.pantry.items, &self.config.substitutions);
        let count = snapshot.recipes.len();
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        gauge!("corpus_recipes").set(count as f64);
        info!(recipes = count, "corpus reloaded");
    }

    /// Replace the corpus with raw records. Malformed records are skipped.
    pub fn reload(&self, records: Vec<serde_json::Value>) -> ReloadOutcome {
        let (recipes, skipped) = recipes_from_values(records);
        let count = recipes.len();
        self.install(recipes);
        counter!("corpus_reloads_total", "outcome" => "loaded").increment(1);
        ReloadOutcome::Loaded {
            recipes: count,
            skipped,
        }
    }

    /// Reload from a corpus file. On failure the current snapshot stays.
    pub fn reload_from_path(&self, path: &Path) -> ReloadOutcome {
        match load_corpus(path) {
            CorpusLoad::Loaded { recipes, skipped } => {
                let count = recipes.len();
                self.install(recipes);
                counter!("corpus_reloads_total", "outcome" => "loaded").increment(1);
                ReloadOutcome::Loaded {
                    recipes: count,
                    skipped,
                }
            }
            CorpusLoad::LoadFailed { reason } => {
                counter!("corpus_reloads_total", "outcome" => "failed").increment(1);
                warn!(%reason, "corpus reload failed, keeping current snapshot");
                ReloadOutcome::Failed { reason }
            }
        }
    }

    /// Reload from the configured corpus path.
    pub fn reload_configured(&self) -> ReloadOutcome {
        self.reload_from_path(&self.config.paths.recipes)
    }

    /// Re-read the weight file. A bad or missing file keeps current weights.
    pub fn reload_weights(&self) -> WeightsLoad {
        self.feedback.reload()
    }

    /// Autocomplete over known ingredient terms: substring match, shortest first.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let q = query.trim().to_lowercase();
        if q.is_empty() || limit == 0 {
            return Vec::new();
        }
        let snap = self.snapshot();
        let mut hits: Vec<&str> = snap.canon.terms().filter(|t| t.contains(&q)).collect();
        hits.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        hits.into_iter().take(limit).map(str::to_string).collect()
    }

    /// Show how an input is normalized and what ends up available.
    pub fn trace(&self, input: impl Into<IngredientInput>) -> Trace {
        let input = input.into();
        let phrases = input.phrases();
        let snap = self.snapshot();
        let av = compute_availability(phrases.iter().copied(), &snap.pantry, &snap.canon);

        Trace {
            phrases: phrases
                .iter()
                .map(|p| PhraseTrace {
                    raw: p.to_string(),
                    normalized: normalize(p),
                    canonical: snap.canon.canonicalize(p),
                })
                .collect(),
            user: sorted(&av.user),
            pantry: sorted(&av.pantry),
            available: sorted(&av.available),
        }
    }
}

const WATCH_INTERVAL: Duration = Duration::from_secs(2);

// RECIPES_HOT_RELOAD=1, honoured in dev builds/environments only
fn corpus_watch_requested() -> bool {
    std::env::var("RECIPES_HOT_RELOAD").is_ok_and(|v| v == "1") && is_dev_env()
}

/// Tracks a file's modification time between polls.
#[derive(Debug)]
struct MtimeWatch {
    path: PathBuf,
    seen: Option<SystemTime>,
}

impl MtimeWatch {
    fn new(path: PathBuf) -> Self {
        let seen = Self::mtime(&path);
        Self { path, seen }
    }

    fn mtime(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    /// True once per forward move of the mtime, or when the file appears.
    /// An unreadable file is ignored until it is readable again.
    fn poll(&mut self) -> bool {
        let Some(now) = Self::mtime(&self.path) else {
            return false;
        };
        let moved = self.seen.map_or(true, |seen| now > seen);
        if moved {
            self.seen = Some(now);
        }
        moved
    }
}

/// Background thread that re-reads the corpus file whenever it is rewritten.
/// No-op unless hot reload is requested in a dev environment.
pub fn start_corpus_watch(engine: Arc<Engine>, path: PathBuf) {
    if !corpus_watch_requested() {
        return;
    }
    info!(path = %path.display(), "watching corpus file for changes");

    thread::spawn(move || {
        let mut watch = MtimeWatch::new(path);
        loop {
            thread::sleep(WATCH_INTERVAL);
            if watch.poll() {
                let outcome = engine.reload_from_path(&watch.path);
                debug!(?outcome, "corpus file changed");
            }
        }
    });
}
