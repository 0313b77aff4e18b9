//! Core pipeline orchestration and domain logic for Recap.
//!
//! This crate ties together the insight history, item reconciliation, the
//! validated generator, and prompt construction into the end-to-end meeting
//! pipeline ([`pipeline::run_pipeline`]).

pub mod generator;
pub mod history;
pub mod meeting;
pub mod pipeline;
pub mod prompts;
pub mod reconcile;

pub use generator::{Generated, RetryPolicy, generate_with_retry, is_valid_content};
pub use history::{
    FsInsightRepository, HistoricalCorpus, HistoryExclusion, HistoryWindow, InsightRepository,
    load_history,
};
pub use pipeline::{
    MeetingInput, PipelineOutput, PipelineSettings, PipelineStage, ProgressReporter,
    SilentProgress, reconcile_history, run_pipeline,
};
pub use reconcile::{ReconciledItems, ReconciliationResult, reconcile};
