//! Markdown and item-text utilities for meeting documents.
//!
//! - [`normalize`] / [`tokenize`]: canonical keys for checklist items
//! - [`ItemMatcher`] / [`is_same_item`]: fuzzy "same work item" test
//! - [`extract_section_items`] / [`strip_sections`]: `### ` section handling
//! - [`date_header`] and friends: the `## Meeting Date:` header contract
//! - [`tidy_generated`]: cleanup of raw backend output

mod cleanup;
mod header;
mod normalize;
mod sections;
mod similarity;

pub use cleanup::tidy_generated;
pub use header::{
    DATE_HEADER_MARKER, date_header, ensure_date_header, has_date_header, strip_date_header,
};
pub use normalize::{normalize, tokenize};
pub use sections::{extract_section_items, strip_sections};
pub use similarity::{DEFAULT_OVERLAP_THRESHOLD, ItemMatcher, TokenOverlapMatcher, is_same_item};
