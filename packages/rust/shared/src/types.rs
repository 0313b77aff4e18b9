//! Core domain types for Recap meeting documents.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// File name suffix identifying deeper-insight documents.
pub const INSIGHT_SUFFIX: &str = "-deeper-insights.md";

/// File name suffix for meeting summaries.
pub const SUMMARY_SUFFIX: &str = "-summary.md";

/// File name suffix for corrected transcriptions.
pub const TRANSCRIPTION_SUFFIX: &str = "-transcription.txt";

/// Matches a leading `YYYY_MM_DD` tag in a file name.
static DATE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4}_[0-9]{2}_[0-9]{2})").expect("date tag regex"));

// ---------------------------------------------------------------------------
// DateTag
// ---------------------------------------------------------------------------

/// A zero-padded `YYYY_MM_DD` tag, compared lexically.
///
/// Lexical order equals chronological order only because every tag is
/// zero-padded. Names without a tag fall back to [`DateTag::SENTINEL`],
/// which sorts before every real date.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateTag(String);

impl DateTag {
    /// Tag used for file names that do not start with a date.
    pub const SENTINEL: &'static str = "0000_00_00";

    /// Build the tag for a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y_%m_%d").to_string())
    }

    /// Parse the leading tag of a file name, or fall back to the sentinel.
    pub fn from_filename(filename: &str) -> Self {
        DATE_TAG_RE
            .captures(filename)
            .map(|caps| Self(caps[1].to_string()))
            .unwrap_or_else(Self::sentinel)
    }

    /// The sentinel tag (`0000_00_00`).
    pub fn sentinel() -> Self {
        Self(Self::SENTINEL.to_string())
    }

    /// Whether this is the sentinel tag.
    pub fn is_sentinel(&self) -> bool {
        self.0 == Self::SENTINEL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DateTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// InsightDocument
// ---------------------------------------------------------------------------

/// A previously generated deeper-insight document, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightDocument {
    /// File name (or store key) of the document.
    pub filename: String,
    /// Leading date tag of the file name.
    pub date_tag: DateTag,
    /// Full markdown content.
    pub raw_content: String,
}

impl InsightDocument {
    /// Create a document, deriving its date tag from the file name.
    pub fn new(filename: impl Into<String>, raw_content: impl Into<String>) -> Self {
        let filename = filename.into();
        let date_tag = DateTag::from_filename(&filename);
        Self {
            filename,
            date_tag,
            raw_content: raw_content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryOrder
// ---------------------------------------------------------------------------

/// Which end of the history window is kept once more than N documents exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryOrder {
    /// Keep the N oldest documents.
    #[default]
    OldestFirst,
    /// Keep the N most recent documents.
    NewestFirst,
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Format a meeting date the way the generated headers expect it,
/// e.g. `Wednesday, July 2, 2025`.
pub fn format_meeting_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_tag_from_date_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 2).unwrap();
        assert_eq!(DateTag::from_date(date).as_str(), "2025_07_02");
    }

    #[test]
    fn date_tag_from_filename() {
        let tag = DateTag::from_filename("2025_07_02-deeper-insights.md");
        assert_eq!(tag.as_str(), "2025_07_02");
        assert!(!tag.is_sentinel());
    }

    #[test]
    fn malformed_filename_falls_back_to_sentinel() {
        for name in [
            "notes-deeper-insights.md",
            "2025_7_2-deeper-insights.md",
            "٢٠٢٥_٠٧_٠٢-deeper-insights.md",
            "",
        ] {
            let tag = DateTag::from_filename(name);
            assert!(tag.is_sentinel(), "{name} should map to the sentinel");
        }
    }

    #[test]
    fn sentinel_sorts_before_real_dates() {
        let mut tags = vec![
            DateTag::from_filename("2025_03_01-deeper-insights.md"),
            DateTag::from_filename("undated-deeper-insights.md"),
            DateTag::from_filename("2024_12_31-deeper-insights.md"),
        ];
        tags.sort();
        let ordered: Vec<&str> = tags.iter().map(DateTag::as_str).collect();
        assert_eq!(ordered, vec!["0000_00_00", "2024_12_31", "2025_03_01"]);
    }

    #[test]
    fn insight_document_derives_tag() {
        let doc = InsightDocument::new("2025_01_15-deeper-insights.md", "# body");
        assert_eq!(doc.date_tag.as_str(), "2025_01_15");
        assert_eq!(doc.raw_content, "# body");
    }

    #[test]
    fn meeting_date_long_form() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 2).unwrap();
        assert_eq!(format_meeting_date(date), "Wednesday, July 2, 2025");
    }

    #[test]
    fn history_order_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            order: HistoryOrder,
        }
        let parsed: Wrapper = toml::from_str("order = \"newest-first\"").unwrap();
        assert_eq!(parsed.order, HistoryOrder::NewestFirst);
    }
}
