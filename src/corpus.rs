// src/corpus.rs
//! Recipe corpus: record schema, tolerant JSON loading and the load outcome.
//!
//! A corpus file is a JSON array of
//! `{ "id": 1 | "r-1", "name": "...", "ingredients": ["..."], "steps": ["..."] }`.
//! Records without an id are skipped; other odd fields degrade field by
//! field. An unreadable or non-array file
//! yields `CorpusLoad::LoadFailed` and callers fall back to an empty corpus.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_INSTRUCTION: &str = "Cook until done.";

/// Text of a JSON scalar: strings are trimmed, numbers and booleans are
/// printed. `None` for null, arrays and objects.
pub fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Recipe id as a weight-table key. Blank ids count as missing.
pub fn id_key(v: &Value) -> Option<String> {
    scalar_text(v).filter(|s| !s.is_empty())
}

/// One entry of the corpus file, as supplied by the loader. Fields stay loose
/// JSON so a single odd field degrades instead of dropping the record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorpusRecord {
    pub id: Value,
    pub name: Value,
    pub ingredients: Value,
    pub steps: Value,
}

/// Immutable recipe as held by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instruction: String,
}

impl Recipe {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ingredients: Vec<String>,
        instruction: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ingredients,
            instruction: instruction.unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
        }
    }

    /// Convert a raw record. Records without a usable id cannot receive
    /// feedback and are rejected; every other field degrades. Non-string
    /// ingredient entries are dropped, a non-list `ingredients` counts as
    /// none, and `steps` may be a list or a single string.
    pub fn from_record(rec: CorpusRecord) -> Option<Self> {
        let id = id_key(&rec.id)?;
        let name = scalar_text(&rec.name).unwrap_or_default();

        let ingredients = match rec.ingredients {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let instruction = match rec.steps {
            Value::Array(items) => items.into_iter().find_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            }),
            Value::String(s) => Some(s),
            _ => None,
        }
        .filter(|s| !s.trim().is_empty());

        Some(Self::new(id, name, ingredients, instruction))
    }
}

/// Outcome of reading a corpus file. Both variants are safe to serve from;
/// the distinction exists for logs and the reload endpoint.
#[derive(Debug, Clone)]
pub enum CorpusLoad {
    Loaded { recipes: Vec<Recipe>, skipped: usize },
    LoadFailed { reason: String },
}

/// Convert already-parsed JSON values into recipes, in order, skipping
/// entries that do not fit the record schema.
pub fn recipes_from_values(values: Vec<Value>) -> (Vec<Recipe>, usize) {
    let mut recipes = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for (idx, v) in values.into_iter().enumerate() {
        let recipe = serde_json::from_value::<CorpusRecord>(v)
            .ok()
            .and_then(Recipe::from_record);
        match recipe {
            Some(r) => recipes.push(r),
            None => {
                skipped += 1;
                warn!(index = idx, "skipping malformed corpus record");
            }
        }
    }
    (recipes, skipped)
}

/// Parse a corpus from a JSON string.
pub fn parse_corpus_str(s: &str) -> CorpusLoad {
    match serde_json::from_str::<Vec<Value>>(s) {
        Ok(values) => {
            let (recipes, skipped) = recipes_from_values(values);
            CorpusLoad::Loaded { recipes, skipped }
        }
        Err(e) => CorpusLoad::LoadFailed {
            reason: format!("invalid corpus JSON: {e}"),
        },
    }
}

/// Read a corpus file. Never returns an error; failures are a `LoadFailed`.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> CorpusLoad {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(s) => parse_corpus_str(&s),
        Err(e) => CorpusLoad::LoadFailed {
            reason: format!("failed to read corpus at {}: {}", path.display(), e),
        },
    }
}
