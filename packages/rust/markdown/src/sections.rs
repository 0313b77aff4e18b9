//! Named `### ` sections and their bullet items.
//!
//! A section starts at a level-3 heading whose text begins (case-insensitively)
//! with the wanted prefix, and ends at the next level-3 heading of any title.
//! Deeper (`####`) and shallower (`##`) headings do not end a section.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `### Title` on a trimmed line.
static H3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s+(.+)$").expect("H3 regex"));

/// Bullet markers recognised inside sections, each followed by a space.
const BULLET_MARKERS: [&str; 3] = ["- ", "• ", "* "];

/// Level-3 heading text of `line`, if it is one.
fn h3_title(line: &str) -> Option<&str> {
    H3_RE
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn title_matches(title: &str, prefix: &str) -> bool {
    title.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Bullet text of a trimmed line, with the marker removed.
fn bullet_text(line: &str) -> Option<&str> {
    BULLET_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
}

/// Bullet items of every section whose heading starts with `title_prefix`.
///
/// Items come back in document order with their markers stripped and
/// surrounding whitespace trimmed. Non-bullet lines inside the section and
/// everything outside it are ignored; the section may run to end of file.
pub fn extract_section_items(document: &str, title_prefix: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut inside = false;

    for line in document.lines() {
        if let Some(title) = h3_title(line) {
            inside = title_matches(title, title_prefix);
            continue;
        }
        if !inside {
            continue;
        }
        if let Some(text) = bullet_text(line.trim()) {
            if !text.is_empty() {
                items.push(text.to_string());
            }
        }
    }

    items
}

/// Remove every section whose heading starts with one of `title_prefixes`,
/// headings included. The remaining lines are rejoined and trimmed.
pub fn strip_sections(document: &str, title_prefixes: &[&str]) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut inside = false;

    for line in document.lines() {
        if let Some(title) = h3_title(line) {
            inside = title_prefixes.iter().any(|p| title_matches(title, p));
            if inside {
                continue;
            }
        }
        if !inside {
            kept.push(line);
        }
    }

    kept.join("\n").trim().to_string()
}
