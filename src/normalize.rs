// src/normalize.rs
//! Ingredient text normalizer: quantity/unit stripping, noise-word removal,
//! punctuation folding and synonym fixes, plus the suffix-based singularizer.
//!
//! Everything here is a pure function over `&str`. Garbage in yields an empty
//! string out; nothing in this module can fail.

use once_cell::sync::Lazy;
use regex::Regex;

/// Units of measure, including their abbreviations. Shared by the
/// "quantity + unit" pass and the "bare unit" pass.
const UNITS: &str = r"(?:g|gm|grams?|kgs?|ml|l|litres?|liters?|cups?|tbsp|tsp|teaspoons?|tablespoons?|oz|ounces?|lbs?|pounds?|pieces?|slices?)";

/// Texture / preparation descriptors that never change which ingredient is meant.
const NOISE_WORDS: &[&str] = &[
    "boneless", "fresh", "chopped", "sliced", "cooked", "raw", "boiled", "diced", "minced",
    "grated", "peeled", "mashed", "crushed", "whole", "large", "medium", "small", "dried",
    "powder", "powdered", "paste", "seeds", "leaves", "pods", "sticks", "bulbs", "cloves",
    "stems", "roots",
];

/// Exact-match rewrites applied to the fully cleaned phrase.
const SYNONYMS: &[(&str, &str)] = &[
    ("brinjal", "eggplant"),
    ("chilli", "chili"),
    ("chillies", "chili"),
    ("red chili", "chili"),
    ("red chilli", "chili"),
    ("red chillies", "chili"),
];

static RE_FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+/\d+").expect("fraction regex"));

static RE_QTY_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\d*\.?\d+\s*{UNITS}\b")).expect("quantity+unit regex")
});

static RE_BARE_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\b{UNITS}\b")).expect("bare unit regex"));

static RE_BARE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").expect("integer regex"));

static RE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", NOISE_WORDS.join("|"))).expect("noise regex")
});

static RE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("punctuation regex"));

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Clean a raw ingredient phrase into its canonical surface form.
///
/// Order matters: quantities and units go first, then noise words, then
/// punctuation. Reordering leaves artifacts such as stray `"/"` or `"s"`.
///
/// ```
/// use pantry_match::normalize::normalize;
/// assert_eq!(normalize("2 cups chopped boneless chicken"), "chicken");
/// assert_eq!(normalize("Brinjal"), "eggplant");
/// ```
pub fn normalize(phrase: &str) -> String {
    let p = phrase.trim().to_lowercase();
    if p.is_empty() {
        return String::new();
    }

    let p = RE_FRACTION.replace_all(&p, "");
    let p = RE_QTY_UNIT.replace_all(&p, "");
    let p = RE_BARE_UNIT.replace_all(&p, "");
    let p = RE_BARE_INT.replace_all(&p, "");
    let p = RE_NOISE.replace_all(&p, "");
    let p = RE_PUNCT.replace_all(&p, " ");
    let p = RE_WS.replace_all(&p, " ");
    let p = p.trim();

    match SYNONYMS.iter().find(|(from, _)| *from == p) {
        Some((_, to)) => (*to).to_string(),
        None => p.to_string(),
    }
}

/// Heuristic singular form. Not a dictionary lookup: "spices" becomes "spic",
/// "sauces" becomes "sauc". Callers only rely on it being deterministic.
pub fn singularize(word: &str) -> String {
    let w = word.trim();
    if let Some(stem) = w.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if w.ends_with("es") && !w.ends_with("oes") && !w.ends_with("ses") {
        return w[..w.len() - 2].to_string();
    }
    if w.ends_with("oes") {
        return w[..w.len() - 2].to_string();
    }
    if w.ends_with('s') && !w.ends_with("ss") && !w.ends_with("us") {
        return w[..w.len() - 1].to_string();
    }
    w.to_string()
}

/// Split a single comma-separated user input into trimmed, non-empty parts.
pub fn split_input(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
