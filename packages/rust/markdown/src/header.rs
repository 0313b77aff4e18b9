//! The `## Meeting Date: <date>` header every generated document starts with.

use chrono::NaiveDate;

use recap_shared::format_meeting_date;

/// Marker that opens the date header line.
pub const DATE_HEADER_MARKER: &str = "## Meeting Date:";

/// Build the header line for `date`.
pub fn date_header(date: NaiveDate) -> String {
    format!("{DATE_HEADER_MARKER} {}", format_meeting_date(date))
}

/// Whether the first non-whitespace line of `text` is a date header.
pub fn has_date_header(text: &str) -> bool {
    text.trim_start().starts_with(DATE_HEADER_MARKER)
}

/// `text` without its leading date header line, if it has one.
pub fn strip_date_header(text: &str) -> &str {
    let body = text.trim_start();
    if !body.starts_with(DATE_HEADER_MARKER) {
        return text;
    }
    match body.split_once('\n') {
        Some((_, rest)) => rest,
        None => "",
    }
}

/// Prepend a header for `date` unless `text` already starts with one.
pub fn ensure_date_header(text: &str, date: NaiveDate) -> String {
    if has_date_header(text) {
        return text.to_string();
    }
    format!("{}\n\n{}", date_header(date), text.trim_start())
}
