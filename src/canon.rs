// src/canon.rs
//! Corpus-wide canonicalization map.
//!
//! Built once per corpus load so that recipe-side and user-side tokens that
//! mean the same thing ("onions" / "onion") collapse onto one key.

use std::collections::HashMap;

use crate::corpus::Recipe;
use crate::normalize::{normalize, singularize};

#[derive(Debug, Clone, Default)]
pub struct CanonicalMap {
    terms: HashMap<String, String>,
}

impl CanonicalMap {
    /// Build from recipes in corpus order; later entries overwrite earlier ones.
    /// Every value is the singular form of its key, so the resulting lookups
    /// are the same for any ordering of the corpus.
    pub fn build(recipes: &[Recipe]) -> Self {
        let mut terms = HashMap::new();
        for recipe in recipes {
            for phrase in &recipe.ingredients {
                let token = normalize(phrase);
                if token.is_empty() {
                    continue;
                }
                let singular = singularize(&token);
                if singular != token {
                    terms.insert(singular.clone(), singular.clone());
                    terms.insert(token, singular);
                } else {
                    terms.insert(token.clone(), token);
                }
            }
        }
        Self { terms }
    }

    /// Resolve an already-normalized token. A miss falls back to the singular
    /// form (and that form's representative, if known). The map is never
    /// extended by lookups.
    pub fn resolve(&self, token: &str) -> String {
        if let Some(canon) = self.terms.get(token) {
            return canon.clone();
        }
        let singular = singularize(token);
        match self.terms.get(&singular) {
            Some(canon) => canon.clone(),
            None => singular,
        }
    }

    /// Normalize + resolve a raw phrase. `None` when nothing survives cleaning.
    pub fn canonicalize(&self, phrase: &str) -> Option<String> {
        let token = normalize(phrase);
        if token.is_empty() {
            None
        } else {
            Some(self.resolve(&token))
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: &str, ingredients: &[&str]) -> Recipe {
        Recipe::new(id, id, ingredients.iter().map(|s| s.to_string()).collect(), None)
    }

    #[test]
    fn plural_and_singular_share_representative() {
        let map = CanonicalMap::build(&[recipe("1", &["2 onions", "potatoes", "rice"])]);
        assert_eq!(map.resolve("onions"), "onion");
        assert_eq!(map.resolve("onion"), "onion");
        assert_eq!(map.resolve("potatoes"), "potato");
        assert_eq!(map.resolve("rice"), "rice");
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn miss_falls_back_to_singular_without_inserting() {
        let map = CanonicalMap::build(&[recipe("1", &["carrot"])]);
        assert_eq!(map.resolve("carrots"), "carrot");
        // suffix rule, not a dictionary: "-es" is dropped
        assert_eq!(map.resolve("apples"), "appl");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn corpus_order_does_not_change_lookups() {
        let recipes = vec![
            recipe("a", &["cheese", "2 onions", "tomatoes"]),
            recipe("b", &["cheeses", "onion", "berries"]),
            recipe("c", &["Tomato", "berry", "rice"]),
        ];
        let forward = CanonicalMap::build(&recipes);
        let mut reversed_order = recipes.clone();
        reversed_order.reverse();
        let reversed = CanonicalMap::build(&reversed_order);

        assert_eq!(forward.len(), reversed.len());
        for token in [
            "cheese", "cheeses", "onion", "onions", "tomato", "tomatoes", "berry",
            "berries", "rice", "carrots",
        ] {
            assert_eq!(forward.resolve(token), reversed.resolve(token), "{token}");
        }
        assert_eq!(forward.resolve("cheeses"), "cheese");
        assert_eq!(forward.resolve("berries"), "berry");
    }

    #[test]
    fn canonicalize_skips_empty_phrases() {
        let map = CanonicalMap::build(&[recipe("1", &["2 cups", "Tomatoes"])]);
        assert_eq!(map.canonicalize("2 cups"), None);
        assert_eq!(map.canonicalize("3 tomatoes").as_deref(), Some("tomato"));
        assert_eq!(map.len(), 2);
    }
}
