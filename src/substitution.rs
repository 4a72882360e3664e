// src/substitution.rs
//! Static substitution table: acceptable stand-ins for a missing ingredient.
//!
//! Entries are one-directional; symmetry exists only where the table lists
//! both directions. Lookups are one level deep, never transitive.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use crate::canon::CanonicalMap;

pub const DEFAULT_SUBSTITUTION_PENALTY: u32 = 15;

/// Result of a substitution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution {
    pub substitute: Option<String>,
    pub penalty: u32,
}

impl Substitution {
    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SubstitutionTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SubstitutionTable {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Built-in table, used when no config overrides it.
    pub fn default_seed() -> Self {
        let mut entries = BTreeMap::new();
        for (k, v) in [
            ("capsicum", &["carrot", "bell pepper"][..]),
            ("cream", &["milk", "malai"]),
            ("butter", &["ghee", "oil"]),
            ("ghee", &["butter", "oil"]),
            ("sugar", &["jaggery", "honey"]),
            ("jaggery", &["sugar", "brown sugar"]),
            ("paneer", &["tofu", "chicken"]),
            ("chicken", &["paneer", "tofu", "soya chunks"]),
            ("lemon", &["vinegar", "amchur"]),
            ("yogurt", &["curd", "buttermilk"]),
            ("maida", &["wheat flour", "atta"]),
            ("corn flour", &["rice flour", "arrowroot powder"]),
        ] {
            entries.insert(k.to_string(), v.iter().map(|s| s.to_string()).collect());
        }
        Self { entries }
    }

    /// Rewrite keys and substitutes into canonical tokens so they compare
    /// equal to tokens produced from recipes and user input. Keys that
    /// collapse together have their lists concatenated in key order;
    /// duplicate substitutes keep their first position.
    pub fn canonicalized(&self, canon: &CanonicalMap) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (raw_key, raw_subs) in &self.entries {
            let Some(key) = canon.canonicalize(raw_key) else {
                continue;
            };
            let list = entries.entry(key.clone()).or_default();
            for raw in raw_subs {
                if let Some(sub) = canon.canonicalize(raw) {
                    if sub != key && !list.contains(&sub) {
                        list.push(sub);
                    }
                }
            }
        }
        entries.retain(|_, v| !v.is_empty());
        Self { entries }
    }

    pub fn substitutes_for(&self, token: &str) -> &[String] {
        self.entries.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First listed substitute present in `candidates`, with `penalty`.
    pub fn try_substitute(
        &self,
        missing: &str,
        candidates: &HashSet<String>,
        penalty: u32,
    ) -> Substitution {
        self.substitutes_for(missing)
            .iter()
            .find(|sub| candidates.contains(*sub))
            .map(|sub| Substitution {
                substitute: Some(sub.clone()),
                penalty,
            })
            .unwrap_or_else(Substitution::none)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
