//! Cleanup pipeline for markdown returned by the generation backend.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! Models sometimes wrap the whole answer in a code fence or echo the `---`
//! delimiters from the example in the prompt; both are removed here.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on generated markdown.
///
/// Blank or whitespace-only input comes back as an empty string.
pub fn tidy_generated(md: &str) -> String {
    if md.trim().is_empty() {
        return String::new();
    }

    let mut result = md.trim().to_string();

    result = strip_wrapping_fence(&result);
    result = strip_edge_delimiters(&result);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);
    result = ensure_trailing_newline(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Unwrap a fenced answer
// ---------------------------------------------------------------------------

/// Remove a code fence enclosing the entire text (```` ```markdown ````, ```` ```md ```` or bare).
fn strip_wrapping_fence(md: &str) -> String {
    static OPEN_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^```(?:markdown|md)?\s*$").expect("valid regex")
    });

    let lines: Vec<&str> = md.lines().collect();
    if lines.len() < 2 {
        return md.to_string();
    }

    let first = lines[0].trim();
    let last = lines[lines.len() - 1].trim();
    if !OPEN_FENCE_RE.is_match(first) || last != "```" {
        return md.to_string();
    }

    lines[1..lines.len() - 1].join("\n").trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Drop echoed `---` delimiters
// ---------------------------------------------------------------------------

/// Remove `---` lines at the very start and end of the text.
fn strip_edge_delimiters(md: &str) -> String {
    let mut lines: Vec<&str> = md.lines().collect();

    while lines.first().is_some_and(|l| l.trim() == "---" || l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim() == "---" || l.trim().is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Normalize whitespace
// ---------------------------------------------------------------------------

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 4: Clean up excessive blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 3+ blank lines into exactly 2.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Ensure trailing newline
// ---------------------------------------------------------------------------

/// Ensure the text ends with exactly one newline.
fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
