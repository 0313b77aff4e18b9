//! Application configuration for Recap.
//!
//! User config lives at `~/.recap/recap.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RecapError, Result};
use crate::types::HistoryOrder;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "recap.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".recap";

// ---------------------------------------------------------------------------
// Config structs (matching recap.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directories and history window.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Backend settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Retry policy for generation calls.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Domain terms that transcription tends to get wrong.
    #[serde(default)]
    pub glossary: GlossaryConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory holding `.webm` recordings and caption `.txt` files.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Directory receiving transcriptions, summaries and insight documents.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of historical insight documents fed to reconciliation.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Which end of the history is kept when it exceeds `history_limit`.
    #[serde(default)]
    pub history_order: HistoryOrder,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            history_limit: default_history_limit(),
            history_order: HistoryOrder::default(),
        }
    }
}

fn default_input_dir() -> String {
    "./inputFiles".into()
}
fn default_output_dir() -> String {
    "./outputFiles".into()
}
fn default_history_limit() -> usize {
    6
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API root; any OpenAI-compatible endpoint works.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model for the summary stage.
    #[serde(default = "default_summary_model")]
    pub summary_model: String,

    /// Model for the deeper-insight stage.
    #[serde(default = "default_insight_model")]
    pub insight_model: String,

    /// Model for audio transcription.
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    #[serde(default = "default_insight_max_tokens")]
    pub insight_max_tokens: u32,

    /// Reasoning effort hint, sent for the insight stage only.
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: String,

    /// Deadline for a single backend call. Unset means no deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            summary_model: default_summary_model(),
            insight_model: default_insight_model(),
            transcription_model: default_transcription_model(),
            summary_max_tokens: default_summary_max_tokens(),
            insight_max_tokens: default_insight_max_tokens(),
            reasoning_effort: default_reasoning_effort(),
            request_timeout_secs: None,
        }
    }
}

impl OpenAiConfig {
    /// Parse the configured API root.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| {
            RecapError::config(format!("invalid openai.base_url '{}': {e}", self.base_url))
        })
    }

    /// The per-call deadline, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_summary_model() -> String {
    "o3-2025-04-16".into()
}
fn default_insight_model() -> String {
    "o3-2025-04-16".into()
}
fn default_transcription_model() -> String {
    "whisper-1".into()
}
fn default_summary_max_tokens() -> u32 {
    5000
}
fn default_insight_max_tokens() -> u32 {
    12000
}
fn default_reasoning_effort() -> String {
    "high".into()
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Attempts per stage before best-effort content is accepted.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in ms. Zero retries immediately.
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: 0,
        }
    }
}

impl GenerationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn default_max_attempts() -> u32 {
    3
}

/// `[glossary]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlossaryConfig {
    #[serde(default)]
    pub groups: Vec<GlossaryGroup>,
}

/// `[[glossary.groups]]` entry, e.g. `People: Jason, Laura`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryGroup {
    pub label: String,
    #[serde(default)]
    pub terms: Vec<String>,
}

impl GlossaryConfig {
    /// Render the glossary as one `Label: a, b, c` line per group.
    ///
    /// Groups without terms are skipped.
    pub fn render(&self) -> String {
        self.groups
            .iter()
            .filter(|g| !g.terms.is_empty())
            .map(|g| format!("{}: {}", g.label, g.terms.join(", ")))
            .collect::<Vec<_>>()
            .join(",\n")
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.recap/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| RecapError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.recap/recap.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RecapError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| RecapError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file to `path`, creating its parent directory.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| RecapError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RecapError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| RecapError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Read the API key from the configured env var.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(RecapError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}
