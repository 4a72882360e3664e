// src/feedback.rs
//! # Feedback Store
//!
//! Learned per-recipe weights, adjusted by user `select` / `reject` signals
//! and applied as the final score multiplier.
//!
//! - `select` adds 0.1 (no upper bound; the score clamp is the only cap).
//! - `reject` subtracts 0.1, never going below 0.1 so the recipe stays rankable.
//! - Unseen ids weigh 1.0.
//!
//! Persistence is a flat JSON object `{ "<recipe id>": <weight> }`, loaded
//! wholesale at startup and rewritten wholesale (temp file + rename) after
//! every update. The read-modify-write runs under a single mutex.

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Mutex, PoisonError},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const WEIGHT_STEP: f64 = 0.1;
pub const MIN_WEIGHT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Select,
    Reject,
}

impl FeedbackAction {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackAction::Select => "select",
            FeedbackAction::Reject => "reject",
        }
    }

    /// New weight after applying this action to `current`.
    pub fn apply(self, current: f64) -> f64 {
        match self {
            FeedbackAction::Select => current + WEIGHT_STEP,
            FeedbackAction::Reject => (current - WEIGHT_STEP).max(MIN_WEIGHT),
        }
    }
}

impl FromStr for FeedbackAction {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(FeedbackAction::Select),
            "reject" => Ok(FeedbackAction::Reject),
            _ => Err(FeedbackError::InvalidAction(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("missing recipe id")]
    MissingRecipeId,

    #[error("invalid action `{0}` (expected `select` or `reject`)")]
    InvalidAction(String),

    #[error("unknown recipe id `{0}`")]
    UnknownRecipe(String),

    #[error("failed to persist weights to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FeedbackError {
    /// Caller-side mistakes, as opposed to storage failures.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            FeedbackError::MissingRecipeId
                | FeedbackError::InvalidAction(_)
                | FeedbackError::UnknownRecipe(_)
        )
    }
}

/// Outcome of reading the weight file. Anything but `Loaded` starts from an
/// empty table.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightsLoad {
    Loaded(HashMap<String, f64>),
    Missing,
    Corrupt { reason: String },
}

impl WeightsLoad {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightsLoad::Loaded(_) => "loaded",
            WeightsLoad::Missing => "missing",
            WeightsLoad::Corrupt { .. } => "corrupt",
        }
    }

    pub fn into_table(self) -> HashMap<String, f64> {
        match self {
            WeightsLoad::Loaded(t) => t,
            WeightsLoad::Missing | WeightsLoad::Corrupt { .. } => HashMap::new(),
        }
    }
}

/// Read a weight file. A missing file is not an error.
pub fn load_weights(path: &Path) -> WeightsLoad {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return WeightsLoad::Missing,
        Err(e) => {
            return WeightsLoad::Corrupt {
                reason: format!("read {}: {}", path.display(), e),
            }
        }
    };
    match serde_json::from_str::<HashMap<String, f64>>(&raw) {
        Ok(mut table) => {
            table.retain(|_, w| w.is_finite() && *w >= 0.0);
            WeightsLoad::Loaded(table)
        }
        Err(e) => WeightsLoad::Corrupt {
            reason: format!("parse {}: {}", path.display(), e),
        },
    }
}

/// Overwrite the whole weight file atomically.
pub fn save_weights(path: &Path, table: &HashMap<String, f64>) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    // Sorted keys keep the file diff-friendly.
    let ordered: BTreeMap<&str, f64> = table.iter().map(|(k, v)| (k.as_str(), *v)).collect();

    let tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, &ordered)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[derive(Debug)]
pub struct FeedbackStore {
    path: Option<PathBuf>,
    weights: Mutex<HashMap<String, f64>>,
}

impl FeedbackStore {
    /// Store backed by `path`. Load problems are logged and degrade to an
    /// empty table.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let load = load_weights(&path);
        match &load {
            WeightsLoad::Loaded(t) => {
                info!(path = %path.display(), recipes = t.len(), "loaded recipe weights")
            }
            WeightsLoad::Missing => {
                info!(path = %path.display(), "no weight file yet, starting fresh")
            }
            WeightsLoad::Corrupt { reason } => {
                warn!(path = %path.display(), %reason, "weight file unreadable, starting fresh")
            }
        }
        let table = load.into_table();
        Self {
            path: Some(path),
            weights: Mutex::new(table),
        }
    }

    /// Non-persistent store, for tools and tests.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            weights: Mutex::new(HashMap::new()),
        }
    }

    pub fn weight(&self, recipe_id: &str) -> f64 {
        let guard = self.weights.lock().unwrap_or_else(PoisonError::into_inner);
        guard.get(recipe_id).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    /// Copy of the whole table, so a scoring pass does not hold the lock.
    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.weights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply one feedback event and persist the full table. Returns the new
    /// weight. On a persistence failure the in-memory update is kept.
    pub fn record(&self, recipe_id: &str, action: FeedbackAction) -> Result<f64, FeedbackError> {
        let id = recipe_id.trim();
        if id.is_empty() {
            return Err(FeedbackError::MissingRecipeId);
        }

        let mut guard = self.weights.lock().unwrap_or_else(PoisonError::into_inner);
        let current = guard.get(id).copied().unwrap_or(DEFAULT_WEIGHT);
        let next = action.apply(current);
        guard.insert(id.to_string(), next);

        if let Some(path) = &self.path {
            save_weights(path, &guard).map_err(|source| FeedbackError::Persist {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(next)
    }

    /// Re-read the file. Only a readable file replaces the in-memory table;
    /// a missing or corrupt one leaves the current weights in place.
    pub fn reload(&self) -> WeightsLoad {
        let Some(path) = &self.path else {
            return WeightsLoad::Missing;
        };
        let load = load_weights(path);
        match &load {
            WeightsLoad::Loaded(t) => {
                *self.weights.lock().unwrap_or_else(PoisonError::into_inner) = t.clone();
                info!(path = %path.display(), recipes = t.len(), "recipe weights reloaded");
            }
            WeightsLoad::Missing | WeightsLoad::Corrupt { .. } => {
                warn!(path = %path.display(), outcome = load.as_str(), "weight reload skipped, keeping current table");
            }
        }
        load
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parsing() {
        assert_eq!("select".parse::<FeedbackAction>().unwrap(), FeedbackAction::Select);
        assert_eq!(" REJECT ".parse::<FeedbackAction>().unwrap(), FeedbackAction::Reject);
        let err = "like".parse::<FeedbackAction>().unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("like"));
    }

    #[test]
    fn select_is_unbounded_reject_floors() {
        let store = FeedbackStore::in_memory();
        let mut w = DEFAULT_WEIGHT;
        for _ in 0..20 {
            w = store.record("7", FeedbackAction::Select).unwrap();
        }
        assert!((w - 3.0).abs() < 1e-9);

        for _ in 0..100 {
            w = store.record("7", FeedbackAction::Reject).unwrap();
        }
        assert!((w - MIN_WEIGHT).abs() < 1e-9);
        assert!((store.weight("7") - MIN_WEIGHT).abs() < 1e-9);
        assert_eq!(store.weight("unknown"), DEFAULT_WEIGHT);
    }

    #[test]
    fn blank_id_is_rejected() {
        let store = FeedbackStore::in_memory();
        assert!(matches!(
            store.record("  ", FeedbackAction::Select),
            Err(FeedbackError::MissingRecipeId)
        ));
    }

    #[test]
    fn every_update_rewrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("weights.json");

        let store = FeedbackStore::open(&path);
        store.record("1", FeedbackAction::Select).unwrap();
        store.record("2", FeedbackAction::Reject).unwrap();

        let on_disk = load_weights(&path).into_table();
        assert_eq!(on_disk.len(), 2);
        assert!((on_disk["1"] - 1.1).abs() < 1e-9);
        assert!((on_disk["2"] - 0.9).abs() < 1e-9);

        let reopened = FeedbackStore::open(&path);
        assert!((reopened.weight("1") - 1.1).abs() < 1e-9);
    }

    #[test]
    fn missing_and_corrupt_files_start_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(load_weights(&missing), WeightsLoad::Missing);

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(load_weights(&corrupt), WeightsLoad::Corrupt { .. }));

        let store = FeedbackStore::open(&corrupt);
        assert!(store.snapshot().is_empty());
        assert_eq!(store.weight("1"), DEFAULT_WEIGHT);
    }

    #[test]
    fn reload_keeps_table_when_file_turns_bad() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.json");
        let store = FeedbackStore::open(&path);
        store.record("1", FeedbackAction::Select).unwrap();

        fs::write(&path, "{ truncated").unwrap();
        assert_eq!(store.reload().as_str(), "corrupt");
        assert!((store.weight("1") - 1.1).abs() < 1e-9);

        fs::remove_file(&path).unwrap();
        assert_eq!(store.reload(), WeightsLoad::Missing);
        assert!((store.weight("1") - 1.1).abs() < 1e-9);
    }
}
