// src/ranker.rs
//! Final ordering: every cookable recipe first, then the best near-misses.

use crate::matcher::MatchResult;

pub const DEFAULT_TOP_N: usize = 50;

/// Partition into cookable / near-miss, sort each by descending score and
/// keep the first `top_n` near-misses. The sort is stable, so equal scores
/// keep the order they were scored in (corpus order).
pub fn rank(results: Vec<MatchResult>, top_n: usize) -> Vec<MatchResult> {
    let (mut cookable, mut near_miss): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|r| r.cookable);

    cookable.sort_by(|a, b| b.score.cmp(&a.score));
    near_miss.sort_by(|a, b| b.score.cmp(&a.score));
    near_miss.truncate(top_n);

    cookable.extend(near_miss);
    cookable
}
