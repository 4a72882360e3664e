// src/matcher.rs
//! Recipe matcher & scorer.
//!
//! For one recipe and one availability set this classifies every distinct
//! ingredient as matched, substituted or missing, applies the main-ingredient
//! rule and produces the clamped 0..=100 confidence score.
//!
//! Score:
//!   base = main_ratio * main_weight + overall_ratio * overall_weight
//!   base += relevance_bonus            (user-relevant recipe)
//!   base *= irrelevance_multiplier     (overlaps only on pantry staples)
//!   score = floor((base - substitution penalties) * learned weight), clamped

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::availability::Availability;
use crate::canon::CanonicalMap;
use crate::corpus::Recipe;
use crate::substitution::{SubstitutionTable, DEFAULT_SUBSTITUTION_PENALTY};

pub const MAX_SCORE: u8 = 100;

/// Empirically chosen scoring constants. Defaults reproduce the tuned
/// production behaviour; every field can be overridden from config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub main_weight: f64,
    pub overall_weight: f64,
    pub relevance_bonus: f64,
    pub irrelevance_multiplier: f64,
    pub substitution_penalty: u32,
    /// Non-cookable, non-relevant recipes survive as near-misses only above this overall ratio.
    pub near_miss_ratio: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            main_weight: 50.0,
            overall_weight: 30.0,
            relevance_bonus: 20.0,
            irrelevance_multiplier: 0.1,
            substitution_penalty: DEFAULT_SUBSTITUTION_PENALTY,
            near_miss_ratio: 0.4,
        }
    }
}

impl ScoringParams {
    /// Replace non-finite or negative values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        fn fix(v: &mut f64, fallback: f64) {
            if !v.is_finite() || *v < 0.0 {
                *v = fallback;
            }
        }
        fix(&mut self.main_weight, d.main_weight);
        fix(&mut self.overall_weight, d.overall_weight);
        fix(&mut self.relevance_bonus, d.relevance_bonus);
        fix(&mut self.irrelevance_multiplier, d.irrelevance_multiplier);
        fix(&mut self.near_miss_ratio, d.near_miss_ratio);
        self
    }
}

/// Per-request, per-recipe outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub id: String,
    pub name: String,
    pub score: u8,
    pub cookable: bool,
    /// Direct matches as tokens; substitutions as `"<ingredient> (sub: <substitute>)"`.
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub missing_main: Vec<String>,
    pub substitutions: BTreeMap<String, String>,
    pub instructions: String,
    /// Empty when cookable.
    pub warning: String,
    #[serde(skip)]
    pub relevant: bool,
}

/// Format the near-miss warning for a set of missing main ingredients.
pub fn missing_main_warning(missing_main: &[String]) -> String {
    if missing_main.is_empty() {
        return String::new();
    }
    format!(
        "Missing main ingredient(s): {}. Suggested if you plan to buy it",
        missing_main.join(", ")
    )
}

/// Floor and clamp into `0..=MAX_SCORE`. NaN maps to 0.
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.floor().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

/// Borrowed view over the snapshot pieces the scorer needs.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    pub canon: &'a CanonicalMap,
    pub substitutions: &'a SubstitutionTable,
    pub params: &'a ScoringParams,
}

impl<'a> Matcher<'a> {
    pub fn new(
        canon: &'a CanonicalMap,
        substitutions: &'a SubstitutionTable,
        params: &'a ScoringParams,
    ) -> Self {
        Self {
            canon,
            substitutions,
            params,
        }
    }

    /// Distinct canonical tokens of a recipe, first occurrence order.
    pub fn recipe_tokens(&self, recipe: &Recipe) -> Vec<String> {
        let mut seen = HashSet::new();
        recipe
            .ingredients
            .iter()
            .filter_map(|p| self.canon.canonicalize(p))
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Score one recipe. `None` when the recipe is neither cookable nor a
    /// plausible near-miss and should be left out of the output entirely.
    pub fn score(&self, recipe: &Recipe, av: &Availability, weight: f64) -> Option<MatchResult> {
        let p = self.params;
        let tokens = self.recipe_tokens(recipe);
        let total = tokens.len();
        let main_total = tokens.iter().filter(|t| !av.is_pantry(t)).count();

        let mut matched = Vec::new();
        let mut missing = Vec::new();
        let mut missing_main = Vec::new();
        let mut substitutions = BTreeMap::new();
        let mut matched_main = 0usize;
        let mut user_hits = 0usize;
        let mut penalty = 0u32;

        for token in tokens {
            let is_main = !av.is_pantry(&token);

            if av.contains(&token) {
                if is_main {
                    matched_main += 1;
                    if av.is_user_supplied(&token) {
                        user_hits += 1;
                    }
                }
                matched.push(token);
                continue;
            }

            // Only what the user actually has can stand in for a missing item.
            let sub = self
                .substitutions
                .try_substitute(&token, &av.user, p.substitution_penalty);
            match sub.substitute {
                Some(s) => {
                    penalty = penalty.saturating_add(sub.penalty);
                    if is_main {
                        matched_main += 1;
                    }
                    matched.push(format!("{token} (sub: {s})"));
                    substitutions.insert(token, s);
                }
                None => {
                    if is_main {
                        missing_main.push(token.clone());
                    }
                    missing.push(token);
                }
            }
        }

        let cookable = missing_main.is_empty();
        let relevant = user_hits > 0 || av.user_is_empty();

        let main_ratio = matched_main as f64 / main_total.max(1) as f64;
        let overall_ratio = matched.len() as f64 / total.max(1) as f64;

        let mut base = main_ratio * p.main_weight + overall_ratio * p.overall_weight;
        if relevant {
            base += p.relevance_bonus;
        } else {
            base *= p.irrelevance_multiplier;
        }
        let score = clamp_score((base - f64::from(penalty)) * weight);

        if !cookable && !relevant && overall_ratio <= p.near_miss_ratio {
            return None;
        }

        Some(MatchResult {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            score,
            cookable,
            matched,
            missing,
            warning: missing_main_warning(&missing_main),
            missing_main,
            substitutions,
            instructions: recipe.instruction.clone(),
            relevant,
        })
    }
}
