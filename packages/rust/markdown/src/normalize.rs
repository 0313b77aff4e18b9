//! Canonical text keys for checklist items.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum token length (in chars) kept by [`tokenize`] is one more than this.
const SHORT_TOKEN_MAX: usize = 2;

/// Any maximal run of characters that are neither letters nor digits.
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}]+").expect("non-alnum regex"));

/// Lowercase `text`, collapse every non-alphanumeric run to one space, and trim.
///
/// Whitespace-only or punctuation-only input yields an empty key. An empty key
/// never identifies an item; callers must not match on it.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM_RE.replace_all(&lowered, " ").trim().to_string()
}

/// Normalized tokens longer than two characters, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|t| t.chars().count() > SHORT_TOKEN_MAX)
        .map(str::to_string)
        .collect()
}
