// src/availability.rs
//! What the user can cook with: their own ingredients plus the pantry staples
//! that are assumed to always be on hand.

use std::collections::HashSet;

use crate::canon::CanonicalMap;

/// Staples assumed present in every kitchen.
pub const DEFAULT_PANTRY: &[&str] = &[
    "salt",
    "oil",
    "water",
    "onion",
    "ginger",
    "garlic",
    "spices",
    "basic spices",
    "chilli",
    "red chilli",
    "turmeric",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Availability {
    /// Canonical tokens the user typed in.
    pub user: HashSet<String>,
    /// Canonical pantry staples.
    pub pantry: HashSet<String>,
    /// `user ∪ pantry`.
    pub available: HashSet<String>,
}

impl Availability {
    pub fn contains(&self, token: &str) -> bool {
        self.available.contains(token)
    }

    pub fn is_user_supplied(&self, token: &str) -> bool {
        self.user.contains(token)
    }

    pub fn is_pantry(&self, token: &str) -> bool {
        self.pantry.contains(token)
    }

    /// True when the user supplied nothing that survived normalization.
    pub fn user_is_empty(&self) -> bool {
        self.user.is_empty()
    }
}

/// Run phrases through normalize + resolve and collect the non-empty tokens.
pub fn canonical_set<I, S>(phrases: I, canon: &CanonicalMap) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    phrases
        .into_iter()
        .filter_map(|p| canon.canonicalize(p.as_ref()))
        .collect()
}

/// Merge user phrases with an already-canonical pantry set.
pub fn compute_availability<I, S>(
    user_phrases: I,
    pantry: &HashSet<String>,
    canon: &CanonicalMap,
) -> Availability
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let user = canonical_set(user_phrases, canon);
    let available = user.union(pantry).cloned().collect();
    Availability {
        user,
        pantry: pantry.clone(),
        available,
    }
}
