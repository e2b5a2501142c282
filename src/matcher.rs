//! Fuzzy matching of free-text queries against the game catalog.
//!
//! Scores each entry by a longest-matching-blocks similarity ratio over
//! both name and alias, boosted for substring and prefix hits. Entries
//! below [`MIN_SCORE`] are dropped; at most [`MAX_RESULTS`] survive.

use std::collections::HashMap;

use crate::profiles::model::GameCatalogEntry;

/// Entries scoring below this are not shown.
pub const MIN_SCORE: f64 = 0.20;

/// Upper bound on the ranked result set.
pub const MAX_RESULTS: usize = 20;

/// Rank catalog entries against a query, best first.
///
/// Ties keep catalog order. An empty query or catalog yields an empty set.
pub fn rank(query: &str, catalog: &[GameCatalogEntry]) -> Vec<GameCatalogEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() || catalog.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &GameCatalogEntry)> = catalog
        .iter()
        .filter_map(|entry| {
            let score = score_entry(&query, entry);
            (score >= MIN_SCORE).then_some((score, entry))
        })
        .collect();

    // Stable sort: equal scores preserve catalog order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(MAX_RESULTS)
        .map(|(_, entry)| entry.clone())
        .collect()
}

/// Score a single entry against a lowercase query.
fn score_entry(query: &str, entry: &GameCatalogEntry) -> f64 {
    let name = entry.name.to_lowercase();
    let alias = entry.alias.to_lowercase();

    let mut score = similarity(query, &name).max(similarity(query, &alias));
    if name.contains(query) {
        score += 0.35;
    }
    if alias.contains(query) {
        score += 0.25;
    }
    if name.starts_with(query) {
        score += 0.20;
    }
    if alias.starts_with(query) {
        score += 0.10;
    }
    score
}

/// Normalized two-sequence similarity in [0, 1].
///
/// `2 * M / (len(a) + len(b))` where M is the total length of the longest
/// matching blocks found by recursive longest-common-substring search.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let matched = matching_len(&a, &b);
    (2.0 * matched as f64) / ((a.len() + b.len()) as f64)
}

/// Total matched character count across all matching blocks.
fn matching_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (ai, bi, len) = longest_match(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_len(&a[..ai], &b[..bi]) + matching_len(&a[ai + len..], &b[bi + len..])
}

/// Find the earliest longest matching block between two slices.
///
/// Returns `(start_a, start_b, length)`, `length == 0` when nothing matches.
fn longest_match(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // j2len[j] = length of the match ending at a[i], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, &ca) in a.iter().enumerate() {
        let mut next: HashMap<usize, usize> = HashMap::new();
        for (j, &cb) in b.iter().enumerate() {
            if ca != cb {
                continue;
            }
            let run = if j == 0 {
                1
            } else {
                j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
            };
            next.insert(j, run);
            if run > best.2 {
                best = (i + 1 - run, j + 1 - run, run);
            }
        }
        j2len = next;
    }
    best
}
