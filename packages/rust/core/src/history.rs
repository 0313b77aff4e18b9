//! Historical deeper-insight corpus: discovery, windowing, and item extraction.
//!
//! Storage sits behind [`InsightRepository`]; flat files in the output
//! directory are the only store today ([`FsInsightRepository`]).

use std::future::Future;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use recap_markdown::{extract_section_items, strip_sections};
use recap_shared::{DateTag, HistoryOrder, INSIGHT_SUFFIX, InsightDocument, RecapError, Result};

/// Heading prefix of the carried-forward open items section.
pub const OPEN_ITEMS_SECTION: &str = "Open Items";

/// Heading prefix of the completed items section.
pub const COMPLETED_ITEMS_SECTION: &str = "Completed Items";

/// Separator placed between documents in the combined historical content.
const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Source of previously generated insight documents.
pub trait InsightRepository: Send + Sync {
    /// Every stored insight document, in no particular order.
    ///
    /// `Err` means the store itself is unavailable.
    fn list_documents(&self) -> impl Future<Output = Result<Vec<InsightDocument>>> + Send;
}

/// Insight documents stored as `<tag>-deeper-insights.md` files in one directory.
#[derive(Debug, Clone)]
pub struct FsInsightRepository {
    dir: PathBuf,
}

impl FsInsightRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl InsightRepository for FsInsightRepository {
    async fn list_documents(&self) -> Result<Vec<InsightDocument>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| RecapError::io(&self.dir, e))?;

        let mut documents = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(RecapError::io(&self.dir, e)),
            };

            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(INSIGHT_SUFFIX) {
                continue;
            }

            match tokio::fs::read_to_string(entry.path()).await {
                Ok(content) => documents.push(InsightDocument::new(filename, content)),
                Err(e) => {
                    warn!(file = %filename, error = %e, "skipping unreadable insight document");
                }
            }
        }

        Ok(documents)
    }
}

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

/// Documents a run must not read back as its own history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryExclusion {
    /// Every document whose name starts with this tag is skipped.
    pub current_tag: DateTag,
    /// Name prefix of the run's own outputs, when it is not `current_tag`.
    pub output_tag: Option<String>,
}

impl HistoryExclusion {
    /// Exclude documents from `date`'s day.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            current_tag: DateTag::from_date(date),
            output_tag: None,
        }
    }

    /// Also exclude the insight document written under `tag`.
    pub fn with_output_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if tag != self.current_tag.as_str() {
            self.output_tag = Some(tag);
        }
        self
    }

    /// Whether `filename` is excluded.
    pub fn excludes(&self, filename: &str) -> bool {
        if filename.starts_with(self.current_tag.as_str()) {
            return true;
        }
        self.output_tag
            .as_deref()
            .is_some_and(|tag| filename.strip_suffix(INSIGHT_SUFFIX) == Some(tag))
    }
}

/// How many documents to load and from which end of the history.
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    pub max_documents: usize,
    pub order: HistoryOrder,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            max_documents: 6,
            order: HistoryOrder::OldestFirst,
        }
    }
}

/// Loaded history, ready for reconciliation.
#[derive(Debug, Clone, Default)]
pub struct HistoricalCorpus {
    /// Selected documents, ascending by date tag.
    pub documents: Vec<InsightDocument>,
    /// Open items of every selected document, in processing order.
    pub open_items: Vec<String>,
    /// Completed items of every selected document, in processing order.
    pub closed_items: Vec<String>,
    /// Selected documents minus their item sections, labelled and joined.
    pub combined_content: String,
}

impl HistoricalCorpus {
    pub fn files_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Load the insight history, skipping the documents `exclusion` names.
///
/// An unavailable store is a cold start: it is logged and yields an empty
/// corpus rather than an error.
#[instrument(skip_all, fields(current = %exclusion.current_tag, max = window.max_documents))]
pub async fn load_history<R: InsightRepository>(
    repository: &R,
    exclusion: &HistoryExclusion,
    window: HistoryWindow,
) -> HistoricalCorpus {
    let documents = match repository.list_documents().await {
        Ok(documents) => documents,
        Err(e) => {
            warn!(error = %e, "insight history unavailable, continuing without it");
            return HistoricalCorpus::default();
        }
    };

    let selected = select_documents(documents, exclusion, window);
    let corpus = build_corpus(selected);

    info!(
        files = corpus.files_count(),
        open_items = corpus.open_items.len(),
        closed_items = corpus.closed_items.len(),
        "insight history loaded"
    );

    corpus
}

/// Drop excluded documents, sort by tag, and keep one end of the window.
///
/// The result is always ascending by tag. Ties on the tag fall back to the
/// file name so the order does not depend on directory listing order.
pub(crate) fn select_documents(
    documents: Vec<InsightDocument>,
    exclusion: &HistoryExclusion,
    window: HistoryWindow,
) -> Vec<InsightDocument> {
    let mut candidates: Vec<InsightDocument> = documents
        .into_iter()
        .filter(|doc| !exclusion.excludes(&doc.filename))
        .collect();

    candidates.sort_by(|a, b| {
        a.date_tag
            .cmp(&b.date_tag)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    let excess = candidates.len().saturating_sub(window.max_documents);
    match window.order {
        HistoryOrder::OldestFirst => candidates.truncate(window.max_documents),
        HistoryOrder::NewestFirst => {
            candidates.drain(..excess);
        }
    }

    debug!(
        selected = candidates.len(),
        dropped = excess,
        order = ?window.order,
        "history window applied"
    );

    candidates
}

/// Extract item sections and build the sanitized combined content.
pub(crate) fn build_corpus(documents: Vec<InsightDocument>) -> HistoricalCorpus {
    let mut open_items = Vec::new();
    let mut closed_items = Vec::new();
    let mut sanitized = Vec::with_capacity(documents.len());

    for doc in &documents {
        open_items.extend(extract_section_items(&doc.raw_content, OPEN_ITEMS_SECTION));
        closed_items.extend(extract_section_items(
            &doc.raw_content,
            COMPLETED_ITEMS_SECTION,
        ));

        let body = strip_sections(
            &doc.raw_content,
            &[OPEN_ITEMS_SECTION, COMPLETED_ITEMS_SECTION],
        );
        sanitized.push(format!("[{}]\n{body}", doc.filename));
    }

    HistoricalCorpus {
        documents,
        open_items,
        closed_items,
        combined_content: sanitized.join(DOCUMENT_SEPARATOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory repository for tests.
    struct MemoryRepository(Result<Vec<InsightDocument>>);

    impl InsightRepository for MemoryRepository {
        async fn list_documents(&self) -> Result<Vec<InsightDocument>> {
            match &self.0 {
                Ok(docs) => Ok(docs.clone()),
                Err(e) => Err(RecapError::validation(e.to_string())),
            }
        }
    }

    fn insight(open: &[&str], closed: &[&str]) -> String {
        let mut doc = String::from(
            "## Meeting Date: Monday, June 2, 2025\n\n### Key Decisions\n- Keep scope\n",
        );
        doc.push_str("\n### Open Items (Carried Forward)\n");
        for item in open {
            doc.push_str(&format!("- {item}\n"));
        }
        doc.push_str("\n### Completed Items\n");
        for item in closed {
            doc.push_str(&format!("- {item}\n"));
        }
        doc.push_str("\n### Recommendations\n- Keep going\n");
        doc
    }

    fn doc(name: &str) -> InsightDocument {
        InsightDocument::new(name, insight(&[name], &[]))
    }

    fn names(docs: &[InsightDocument]) -> Vec<&str> {
        docs.iter().map(|d| d.filename.as_str()).collect()
    }

    fn today() -> HistoryExclusion {
        HistoryExclusion::for_date(NaiveDate::from_ymd_opt(2025, 7, 2).unwrap())
    }

    #[test]
    fn select_excludes_today_and_sorts() {
        let docs = vec![
            doc("2025_06_20-deeper-insights.md"),
            doc("2025_07_02-deeper-insights.md"),
            doc("notes-deeper-insights.md"),
            doc("2025_05_01-deeper-insights.md"),
        ];
        let selected = select_documents(docs, &today(), HistoryWindow::default());
        assert_eq!(
            names(&selected),
            vec![
                "notes-deeper-insights.md",
                "2025_05_01-deeper-insights.md",
                "2025_06_20-deeper-insights.md",
            ]
        );
    }

    #[test]
    fn output_tag_is_excluded_when_it_differs_from_the_date() {
        let docs = vec![
            doc("2025_07_02-deeper-insights.md"),
            doc("weekly-sync-deeper-insights.md"),
            doc("weekly-sync-2-deeper-insights.md"),
            doc("2025_06_20-deeper-insights.md"),
        ];
        let exclusion = HistoryExclusion::for_date(NaiveDate::from_ymd_opt(2025, 7, 3).unwrap())
            .with_output_tag("weekly-sync");
        let selected = select_documents(docs, &exclusion, HistoryWindow::default());
        assert_eq!(
            names(&selected),
            vec![
                "weekly-sync-2-deeper-insights.md",
                "2025_06_20-deeper-insights.md",
                "2025_07_02-deeper-insights.md",
            ]
        );
    }

    #[test]
    fn output_tag_equal_to_date_tag_is_not_duplicated() {
        let exclusion = today().with_output_tag("2025_07_02");
        assert_eq!(exclusion.output_tag, None);
        assert!(exclusion.excludes("2025_07_02-deeper-insights.md"));
        assert!(!exclusion.excludes("2025_07_01-deeper-insights.md"));
    }

    #[test]
    fn oldest_first_keeps_the_oldest_n() {
        let docs = (1..=5)
            .map(|d| doc(&format!("2025_06_0{d}-deeper-insights.md")))
            .collect();
        let window = HistoryWindow {
            max_documents: 2,
            order: HistoryOrder::OldestFirst,
        };
        let selected = select_documents(docs, &today(), window);
        assert_eq!(
            names(&selected),
            vec!["2025_06_01-deeper-insights.md", "2025_06_02-deeper-insights.md"]
        );
    }

    #[test]
    fn newest_first_keeps_the_latest_n_in_ascending_order() {
        let docs = (1..=5)
            .rev()
            .map(|d| doc(&format!("2025_06_0{d}-deeper-insights.md")))
            .collect();
        let window = HistoryWindow {
            max_documents: 2,
            order: HistoryOrder::NewestFirst,
        };
        let selected = select_documents(docs, &today(), window);
        assert_eq!(
            names(&selected),
            vec!["2025_06_04-deeper-insights.md", "2025_06_05-deeper-insights.md"]
        );
    }

    #[test]
    fn corpus_collects_items_in_file_order_and_sanitizes() {
        let docs = vec![
            InsightDocument::new(
                "2025_06_01-deeper-insights.md",
                insight(&["Write docs", "Fix login bug"], &[]),
            ),
            InsightDocument::new(
                "2025_06_08-deeper-insights.md",
                insight(&["Write docs"], &["Fix login bug"]),
            ),
        ];
        let corpus = build_corpus(docs);

        assert_eq!(corpus.files_count(), 2);
        assert_eq!(corpus.open_items, vec!["Write docs", "Fix login bug", "Write docs"]);
        assert_eq!(corpus.closed_items, vec!["Fix login bug"]);
        assert!(corpus.combined_content.starts_with("[2025_06_01-deeper-insights.md]\n"));
        assert!(corpus.combined_content.contains("[2025_06_08-deeper-insights.md]\n"));
        assert!(corpus.combined_content.contains("### Key Decisions"));
        assert!(!corpus.combined_content.contains("### Open Items"));
        assert!(!corpus.combined_content.contains("### Completed Items"));
        assert!(!corpus.combined_content.contains("Fix login bug"));
    }

    #[tokio::test]
    async fn unavailable_repository_is_cold_start() {
        let repo = MemoryRepository(Err(RecapError::validation("store offline")));
        let corpus = load_history(&repo, &today(), HistoryWindow::default()).await;
        assert_eq!(corpus.files_count(), 0);
        assert!(corpus.open_items.is_empty());
        assert!(corpus.closed_items.is_empty());
        assert!(corpus.combined_content.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsInsightRepository::new(dir.path().join("does-not-exist"));
        assert!(repo.list_documents().await.is_err());

        let corpus = load_history(&repo, &today(), HistoryWindow::default()).await;
        assert!(corpus.is_empty());
        assert!(corpus.combined_content.is_empty());
    }

    #[tokio::test]
    async fn fs_repository_lists_only_insight_documents() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| std::fs::write(dir.path().join(name), body).unwrap();
        write("2025_06_01-deeper-insights.md", &insight(&["Write docs"], &[]));
        write("2025_06_01-summary.md", "## Summary:\nnot history");
        write("2025_06_01-transcription.txt", "raw words");
        write("2025_07_02-deeper-insights.md", &insight(&["Today only"], &[]));

        let repo = FsInsightRepository::new(dir.path());
        let mut listed = repo.list_documents().await.unwrap();
        listed.sort_by(|a, b| a.filename.cmp(&b.filename));
        assert_eq!(
            names(&listed),
            vec!["2025_06_01-deeper-insights.md", "2025_07_02-deeper-insights.md"]
        );

        let corpus = load_history(&repo, &today(), HistoryWindow::default()).await;
        assert_eq!(corpus.files_count(), 1);
        assert_eq!(corpus.open_items, vec!["Write docs"]);
    }
}
