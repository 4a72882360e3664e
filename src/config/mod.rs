// src/config/mod.rs
pub mod matcher;

pub use matcher::{MatcherConfig, PantrySection, PathsSection, RankingSection};
