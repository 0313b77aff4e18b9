//! Shared types, error model, and configuration for Recap.
//!
//! This crate is the foundation depended on by all other Recap crates.
//! It provides:
//! - [`RecapError`] — the unified error type
//! - Domain types ([`DateTag`], [`InsightDocument`], [`HistoryOrder`])
//! - Configuration ([`AppConfig`] and config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GenerationConfig, GlossaryConfig, GlossaryGroup, OpenAiConfig,
    config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
    resolve_api_key,
};
pub use error::{RecapError, Result};
pub use types::{
    DateTag, HistoryOrder, INSIGHT_SUFFIX, InsightDocument, SUMMARY_SUFFIX, TRANSCRIPTION_SUFFIX,
    format_meeting_date,
};
