//! End-to-end meeting pipeline: summary → history → reconcile → insight → finalize.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use recap_llm::{ChatMessage, ChatRequest, ChatResponse, GenerationBackend, ReasoningEffort};
use recap_markdown::{TokenOverlapMatcher, ensure_date_header, tidy_generated};
use recap_shared::{AppConfig, Result};

use crate::generator::{Generated, RetryPolicy, generate_with_retry};
use crate::history::{HistoryExclusion, HistoryWindow, InsightRepository, load_history};
use crate::prompts::{InsightPromptInput, insight_messages, summary_messages};
use crate::reconcile::ReconciliationResult;

/// Temperature sent with every completion; reasoning models only accept 1.
const TEMPERATURE: f32 = 1.0;

// ---------------------------------------------------------------------------
// Stages & progress
// ---------------------------------------------------------------------------

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Summary,
    HistoryLoad,
    Reconcile,
    Insight,
    Finalize,
}

impl PipelineStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Summary => "Generating summary",
            Self::HistoryLoad => "Loading insight history",
            Self::Reconcile => "Reconciling open items",
            Self::Insight => "Generating deeper insights",
            Self::Finalize => "Finalizing",
        }
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn stage(&self, stage: PipelineStage);
    /// Called when the pipeline completes.
    fn done(&self, output: &PipelineOutput);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: PipelineStage) {}
    fn done(&self, _output: &PipelineOutput) {}
}

// ---------------------------------------------------------------------------
// Settings, input, output
// ---------------------------------------------------------------------------

/// Model parameters for one generation stage.
#[derive(Debug, Clone)]
pub struct StageSettings {
    pub model: String,
    pub max_tokens: u32,
    pub reasoning_effort: Option<ReasoningEffort>,
}

impl StageSettings {
    fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: self.max_tokens,
            reasoning_effort: self.reasoning_effort,
            temperature: Some(TEMPERATURE),
        }
    }
}

/// Everything the pipeline needs besides its inputs and collaborators.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub summary: StageSettings,
    pub insight: StageSettings,
    pub retry: RetryPolicy,
    pub history: HistoryWindow,
    pub matcher: TokenOverlapMatcher,
}

impl PipelineSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let openai = &config.openai;
        Ok(Self {
            summary: StageSettings {
                model: openai.summary_model.clone(),
                max_tokens: openai.summary_max_tokens,
                reasoning_effort: None,
            },
            insight: StageSettings {
                model: openai.insight_model.clone(),
                max_tokens: openai.insight_max_tokens,
                reasoning_effort: Some(openai.reasoning_effort.parse()?),
            },
            retry: RetryPolicy::from_config(&config.generation, openai.request_timeout()),
            history: HistoryWindow {
                max_documents: config.defaults.history_limit,
                order: config.defaults.history_order,
            },
            matcher: TokenOverlapMatcher::default(),
        })
    }
}

/// One meeting's inputs.
#[derive(Debug, Clone)]
pub struct MeetingInput {
    /// Speaker-labelled but inaccurate captions.
    pub live_captions: String,
    /// Accurate transcript without speaker labels.
    pub accurate_transcript: String,
    /// Rendered domain-term glossary.
    pub glossary: String,
    /// Reused instead of generating a new summary.
    pub existing_summary: Option<String>,
    /// Date of the meeting; also excludes same-day documents from history.
    pub meeting_date: NaiveDate,
    /// Name prefix the outputs are written under, excluded from history too.
    pub output_tag: Option<String>,
}

impl MeetingInput {
    /// History documents this run must not read back.
    pub fn history_exclusion(&self) -> HistoryExclusion {
        let exclusion = HistoryExclusion::for_date(self.meeting_date);
        match &self.output_tag {
            Some(tag) => exclusion.with_output_tag(tag.as_str()),
            None => exclusion,
        }
    }
}

/// Result of [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub summary_text: String,
    pub deeper_insights_text: String,
    /// `false` when the summary is exhausted best-effort output.
    pub summary_valid: bool,
    /// `false` when the insight document is exhausted best-effort output.
    pub insights_valid: bool,
    /// Number of earlier insight documents used as context.
    pub history_files: usize,
    /// Open items handed to the insight stage.
    pub carried_forward: Vec<String>,
    /// Tokens billed for the returned generations.
    pub tokens_used: u64,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full meeting pipeline.
///
/// 1. Summary (skipped when `existing_summary` is set)
/// 2. Load the insight history, excluding the meeting's own day and outputs
/// 3. Reconcile historical open and completed items
/// 4. Generate the deeper-insight document
/// 5. Tidy and ensure the date header
#[instrument(skip_all, fields(date = %input.meeting_date))]
pub async fn run_pipeline<B, R>(
    backend: &B,
    repository: &R,
    input: &MeetingInput,
    settings: &PipelineSettings,
    progress: &dyn ProgressReporter,
) -> Result<PipelineOutput>
where
    B: GenerationBackend,
    R: InsightRepository,
{
    let start = Instant::now();
    let mut tokens_used = 0;

    // --- Summary ---
    progress.stage(PipelineStage::Summary);
    let (summary_text, summary_valid) = match &input.existing_summary {
        Some(existing) => {
            info!(chars = existing.len(), "reusing existing summary");
            (existing.clone(), true)
        }
        None => {
            let request = settings.summary.request(summary_messages(
                &input.live_captions,
                &input.accurate_transcript,
                &input.glossary,
                input.meeting_date,
            ));
            let generated =
                complete_with_retry(backend, "summary", &request, &settings.retry).await?;
            tokens_used += generated.value.tokens_used;
            (tidy_generated(&generated.value.text), generated.valid)
        }
    };

    // --- History + reconcile ---
    let reconciled = reconcile_history(
        repository,
        &input.history_exclusion(),
        settings.history,
        &settings.matcher,
        progress,
    )
    .await;

    // --- Insight ---
    progress.stage(PipelineStage::Insight);
    let request = settings.insight.request(insight_messages(&InsightPromptInput {
        summary: &summary_text,
        open_items: &reconciled.historical_open_items,
        historical_content: &reconciled.historical_content,
        files_count: reconciled.files_count,
        meeting_date: input.meeting_date,
    }));
    let generated = complete_with_retry(backend, "insight", &request, &settings.retry).await?;
    tokens_used += generated.value.tokens_used;

    // --- Finalize ---
    progress.stage(PipelineStage::Finalize);
    let deeper_insights_text =
        ensure_date_header(&tidy_generated(&generated.value.text), input.meeting_date);

    if !summary_valid || !generated.valid {
        warn!(
            summary_valid,
            insights_valid = generated.valid,
            "pipeline finished with best-effort content"
        );
    }

    let output = PipelineOutput {
        summary_text,
        deeper_insights_text,
        summary_valid,
        insights_valid: generated.valid,
        history_files: reconciled.files_count,
        carried_forward: reconciled.historical_open_items,
        tokens_used,
    };

    info!(
        history_files = output.history_files,
        carried_forward = output.carried_forward.len(),
        tokens_used,
        elapsed_ms = start.elapsed().as_millis(),
        "pipeline complete"
    );

    progress.done(&output);
    Ok(output)
}

/// Load the history outside `exclusion` and reconcile its items.
///
/// Never fails: an unavailable history is an empty result.
pub async fn reconcile_history<R: InsightRepository>(
    repository: &R,
    exclusion: &HistoryExclusion,
    window: HistoryWindow,
    matcher: &TokenOverlapMatcher,
    progress: &dyn ProgressReporter,
) -> ReconciliationResult {
    progress.stage(PipelineStage::HistoryLoad);
    let corpus = load_history(repository, exclusion, window).await;

    progress.stage(PipelineStage::Reconcile);
    ReconciliationResult::from_corpus(corpus, matcher)
}

async fn complete_with_retry<B: GenerationBackend>(
    backend: &B,
    stage: &str,
    request: &ChatRequest,
    policy: &RetryPolicy,
) -> Result<Generated<ChatResponse>> {
    let generated = generate_with_retry(
        stage,
        policy,
        || backend.complete(request),
        |response: &ChatResponse| response.text.as_str(),
    )
    .await?;

    info!(
        stage,
        attempts = generated.attempts,
        tokens_used = generated.value.tokens_used,
        model = %generated.value.model,
        "stage generated"
    );
    Ok(generated)
}
