// src/config/matcher.rs
//! Engine configuration, loaded from TOML with environment overrides.
//!
//! ```toml
//! [paths]
//! recipes = "data/recipes.json"
//! weights = "data/model_weights.json"
//!
//! [scoring]
//! relevance_bonus = 20.0
//! substitution_penalty = 15
//!
//! [ranking]
//! default_top_n = 50
//! min_display_score = 10
//!
//! [pantry]
//! items = ["salt", "oil", "water"]
//!
//! [substitutions]
//! butter = ["ghee", "oil"]
//! ```
//!
//! Every section is optional; omitted sections keep the built-in defaults.

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::availability::DEFAULT_PANTRY;
use crate::matcher::ScoringParams;
use crate::ranker::DEFAULT_TOP_N;
use crate::substitution::SubstitutionTable;

// --- env defaults & names ---
pub const DEFAULT_MATCHER_CONFIG_PATH: &str = "config/matcher.toml";
pub const DEFAULT_RECIPES_PATH: &str = "data/recipes.json";
pub const DEFAULT_WEIGHTS_PATH: &str = "data/model_weights.json";
pub const DEFAULT_MIN_DISPLAY_SCORE: u8 = 10;

pub const ENV_MATCHER_CONFIG_PATH: &str = "MATCHER_CONFIG_PATH";
pub const ENV_RECIPES_PATH: &str = "RECIPES_PATH";
pub const ENV_WEIGHTS_PATH: &str = "WEIGHTS_PATH";
pub const ENV_TOP_N: &str = "MATCHER_TOP_N";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub recipes: PathBuf,
    pub weights: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            recipes: PathBuf::from(DEFAULT_RECIPES_PATH),
            weights: PathBuf::from(DEFAULT_WEIGHTS_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingSection {
    /// Near-miss cap used when a request does not name one.
    pub default_top_n: usize,
    /// Request-layer display cut-off; the engine itself returns everything.
    pub min_display_score: u8,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            default_top_n: DEFAULT_TOP_N,
            min_display_score: DEFAULT_MIN_DISPLAY_SCORE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PantrySection {
    pub items: Vec<String>,
}

impl Default for PantrySection {
    fn default() -> Self {
        Self {
            items: DEFAULT_PANTRY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub paths: PathsSection,
    pub scoring: ScoringParams,
    pub ranking: RankingSection,
    pub pantry: PantrySection,
    pub substitutions: SubstitutionTable,
}

// parse optional usize env (ignored when not a positive integer)
fn parse_top_n_env(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

impl MatcherConfig {
    /// Built-in configuration, used when no config file exists.
    pub fn default_seed() -> Self {
        Self::default()
    }

    /// Load from `MATCHER_CONFIG_PATH` or `config/matcher.toml`. A missing
    /// file yields the built-in defaults; a malformed one is an error.
    /// Env overrides are applied in both cases.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_MATCHER_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MATCHER_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::from_path(&path)?
        } else {
            info!(path = %path.display(), "no matcher config found, using defaults");
            Self::default_seed()
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read matcher config at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid matcher config at {}: {}", path.display(), e))
    }

    /// Parse from a TOML string; scoring numbers are sanitized.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: MatcherConfig = toml::from_str(toml_str)?;
        cfg.scoring = cfg.scoring.sanitized();
        if cfg.ranking.default_top_n == 0 {
            cfg.ranking.default_top_n = DEFAULT_TOP_N;
        }
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(p) = std::env::var(ENV_RECIPES_PATH) {
            if !p.trim().is_empty() {
                self.paths.recipes = PathBuf::from(p);
            }
        }
        if let Ok(p) = std::env::var(ENV_WEIGHTS_PATH) {
            if !p.trim().is_empty() {
                self.paths.weights = PathBuf::from(p);
            }
        }
        if let Some(n) = parse_top_n_env(std::env::var(ENV_TOP_N).ok()) {
            self.ranking.default_top_n = n;
        }
    }
}
