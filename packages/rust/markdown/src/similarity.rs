//! Fuzzy "same work item" judgement between two checklist lines.
//!
//! Matching is a best-effort heuristic. False positives and negatives are
//! expected; it is fit for collapsing duplicate checklist items across
//! meetings and nothing that needs exactness.

use std::collections::HashSet;

use crate::normalize::{normalize, tokenize};

/// Default share of the smaller token set that must overlap.
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.70;

/// Decides whether two item strings denote the same underlying work item.
pub trait ItemMatcher {
    fn is_same_item(&self, a: &str, b: &str) -> bool;
}

/// Substring containment first, then token-set overlap.
#[derive(Debug, Clone, Copy)]
pub struct TokenOverlapMatcher {
    /// Minimum `|A ∩ B| / min(|A|, |B|)` for a match.
    pub threshold: f64,
}

impl Default for TokenOverlapMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

impl ItemMatcher for TokenOverlapMatcher {
    fn is_same_item(&self, a: &str, b: &str) -> bool {
        let norm_a = normalize(a);
        let norm_b = normalize(b);
        if norm_a.is_empty() || norm_b.is_empty() {
            return false;
        }

        if norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
            return true;
        }

        let tokens_a: HashSet<String> = tokenize(a).into_iter().collect();
        let tokens_b: HashSet<String> = tokenize(b).into_iter().collect();
        if tokens_a.is_empty() || tokens_b.is_empty() {
            return false;
        }

        let shared = tokens_a.intersection(&tokens_b).count();
        let smaller = tokens_a.len().min(tokens_b.len());
        shared as f64 / smaller as f64 >= self.threshold
    }
}

/// [`TokenOverlapMatcher`] with the default threshold.
pub fn is_same_item(a: &str, b: &str) -> bool {
    TokenOverlapMatcher::default().is_same_item(a, b)
}
