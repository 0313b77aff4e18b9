//! Merge historical open and completed items into one carried-forward list.
//!
//! Completed items win: an open item that fuzzy-matches any completed item is
//! dropped, even when worded differently. Open items are only deduplicated
//! against each other by exact normalized key, so a heuristic false positive
//! can at worst make an item look closed; two distinct open items never merge.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use recap_markdown::{ItemMatcher, normalize};

use crate::history::HistoricalCorpus;

/// Deduplicated historical items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciledItems {
    pub open: Vec<String>,
    pub closed: Vec<String>,
}

/// Everything the insight stage needs from history, built fresh per run.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationResult {
    /// Sanitized historical documents, labelled and joined.
    pub historical_content: String,
    pub files_count: usize,
    pub historical_open_items: Vec<String>,
    pub historical_closed_items: Vec<String>,
}

impl ReconciliationResult {
    /// Reconcile a loaded corpus with `matcher`.
    pub fn from_corpus<M: ItemMatcher>(corpus: HistoricalCorpus, matcher: &M) -> Self {
        let files_count = corpus.files_count();
        let items = reconcile(&corpus.open_items, &corpus.closed_items, matcher);
        Self {
            historical_content: corpus.combined_content,
            files_count,
            historical_open_items: items.open,
            historical_closed_items: items.closed,
        }
    }
}

/// Deduplicate closed items, drop open items that match a closed one, then
/// deduplicate what remains. First occurrence wins and order is preserved.
pub fn reconcile<M: ItemMatcher>(
    open_items: &[String],
    closed_items: &[String],
    matcher: &M,
) -> ReconciledItems {
    let closed = dedup_by_key(closed_items.iter());

    let still_open = open_items.iter().filter(|item| {
        !closed
            .iter()
            .any(|closed_item| matcher.is_same_item(item, closed_item))
    });
    let open = dedup_by_key(still_open);

    debug!(
        open_in = open_items.len(),
        closed_in = closed_items.len(),
        open_out = open.len(),
        closed_out = closed.len(),
        "items reconciled"
    );

    ReconciledItems { open, closed }
}

/// Keep the first item per normalized key. Items with an empty key are dropped.
fn dedup_by_key<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| {
            let key = normalize(item);
            !key.is_empty() && seen.insert(key)
        })
        .cloned()
        .collect()
}
