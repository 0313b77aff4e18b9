//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use recap_core::meeting::{
    MeetingPaths, compress_recording, date_from_tag, latest_recording, read_optional,
    read_or_empty, write_output,
};
use recap_core::pipeline::{
    MeetingInput, PipelineOutput, PipelineSettings, PipelineStage, ProgressReporter,
    SilentProgress, reconcile_history, run_pipeline,
};
use recap_core::prompts::transcription_prompt;
use recap_core::{FsInsightRepository, HistoryExclusion, ReconciledItems};
use recap_llm::{OpenAiClient, OpenAiOptions};
use recap_shared::{
    AppConfig, DateTag, INSIGHT_SUFFIX, init_config, init_config_at, load_config,
    load_config_from, resolve_api_key,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Recap — meeting summaries and deeper insights that remember what is still open.
#[derive(Parser)]
#[command(
    name = "recap",
    version,
    about = "Summarize recorded meetings and carry open items forward across meetings.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.recap/recap.toml.
    #[arg(long, global = true, env = "RECAP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Transcribe the latest recording, summarize it, and write deeper insights.
    Run {
        /// Recording name in the input directory, without `.webm` (defaults to the newest).
        #[arg(short, long)]
        recording: Option<String>,

        /// Meeting date, YYYY-MM-DD (defaults to the recording's date tag, then today).
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Generate a new summary even if one exists for this meeting.
        #[arg(long)]
        regenerate_summary: bool,
    },

    /// Generate deeper insights from an existing summary file.
    Insights {
        /// Summary markdown to analyse.
        #[arg(short, long)]
        summary: PathBuf,

        /// Meeting date, YYYY-MM-DD (defaults to the summary's date tag, then today).
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Output file (defaults to `<output_dir>/<tag>-deeper-insights.md`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the open and completed items carried into a meeting.
    History {
        /// Meeting date, YYYY-MM-DD (defaults to today).
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default config file.
    Init,
    /// Print the resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "recap=info",
        1 => "recap=debug",
        _ => "recap=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run {
            recording,
            date,
            regenerate_summary,
        } => cmd_run(config_path, recording, date, regenerate_summary).await,
        Command::Insights { summary, date, out } => {
            cmd_insights(config_path, &summary, date, out).await
        }
        Command::History { date, json } => cmd_history(config_path, date, json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config from `--config` if given, else from the default location.
fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn build_client(config: &AppConfig) -> Result<OpenAiClient> {
    let api_key = resolve_api_key(config)?;
    let client = OpenAiClient::new(OpenAiOptions {
        base_url: config.openai.base_url()?,
        api_key,
        timeout: config.openai.request_timeout(),
    })?;
    Ok(client)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config_path: Option<&Path>,
    recording: Option<String>,
    date: Option<NaiveDate>,
    regenerate_summary: bool,
) -> Result<()> {
    let config = load(config_path)?;
    let client = build_client(&config)?;
    let settings = PipelineSettings::from_config(&config)?;

    let input_dir = PathBuf::from(&config.defaults.input_dir);
    let output_dir = PathBuf::from(&config.defaults.output_dir);

    let recording = match recording {
        Some(name) => name,
        None => latest_recording(&input_dir)?,
    };
    let paths = MeetingPaths::new(&input_dir, &output_dir, &recording);
    let meeting_date = date
        .or_else(|| date_from_tag(&paths.tag))
        .unwrap_or_else(today);
    let glossary = config.glossary.render();

    info!(recording = %recording, tag = %paths.tag, %meeting_date, "processing meeting");

    let progress = CliProgress::new();

    // --- Transcription (reused when already on disk) ---
    let accurate_transcript = match read_optional(&paths.transcription).await? {
        Some(existing) if !existing.trim().is_empty() => {
            info!(path = %paths.transcription.display(), "reusing existing transcription");
            existing
        }
        _ => {
            if !paths.audio.exists() {
                return Err(eyre!("recording not found: {}", paths.audio.display()));
            }
            progress.message("Compressing audio");
            let upload = compress_recording(&paths.audio, &paths.compressed_audio).await?;
            progress.message("Transcribing audio");
            let text = client
                .transcribe(
                    &upload,
                    &transcription_prompt(&glossary),
                    &config.openai.transcription_model,
                )
                .await?;
            write_output(&paths.transcription, &text).await?;
            text
        }
    };

    let live_captions = read_or_empty(&paths.captions).await?;
    let existing_summary = if regenerate_summary {
        None
    } else {
        read_optional(&paths.summary)
            .await?
            .filter(|s| !s.trim().is_empty())
    };
    let reused_summary = existing_summary.is_some();

    let input = MeetingInput {
        live_captions,
        accurate_transcript,
        glossary,
        existing_summary,
        meeting_date,
        output_tag: Some(paths.tag.clone()),
    };
    let repository = FsInsightRepository::new(&output_dir);
    let output = run_pipeline(&client, &repository, &input, &settings, &progress).await?;

    if !reused_summary {
        write_output(&paths.summary, &output.summary_text).await?;
    }
    write_output(&paths.insights, &output.deeper_insights_text).await?;

    print_report(&output);
    println!("  Summary:   {}", paths.summary.display());
    println!("  Insights:  {}", paths.insights.display());
    println!();

    Ok(())
}

async fn cmd_insights(
    config_path: Option<&Path>,
    summary_path: &Path,
    date: Option<NaiveDate>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load(config_path)?;
    let client = build_client(&config)?;
    let settings = PipelineSettings::from_config(&config)?;

    let summary = read_optional(summary_path)
        .await?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| eyre!("summary file is missing or empty: {}", summary_path.display()))?;

    let file_name = summary_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let meeting_date = date
        .or_else(|| date_from_tag(&file_name))
        .unwrap_or_else(today);

    let output_dir = PathBuf::from(&config.defaults.output_dir);
    let out = out.unwrap_or_else(|| {
        output_dir.join(format!("{}{INSIGHT_SUFFIX}", DateTag::from_date(meeting_date)))
    });

    let output_tag = out
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(INSIGHT_SUFFIX))
        .map(str::to_owned);

    let input = MeetingInput {
        live_captions: String::new(),
        accurate_transcript: String::new(),
        glossary: config.glossary.render(),
        existing_summary: Some(summary),
        meeting_date,
        output_tag,
    };
    let repository = FsInsightRepository::new(&output_dir);
    let progress = CliProgress::new();
    let output = run_pipeline(&client, &repository, &input, &settings, &progress).await?;

    write_output(&out, &output.deeper_insights_text).await?;

    print_report(&output);
    println!("  Insights:  {}", out.display());
    println!();

    Ok(())
}

async fn cmd_history(
    config_path: Option<&Path>,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let config = load(config_path)?;
    let settings = PipelineSettings::from_config(&config)?;
    let meeting_date = date.unwrap_or_else(today);

    let repository = FsInsightRepository::new(&config.defaults.output_dir);
    let result = reconcile_history(
        &repository,
        &HistoryExclusion::for_date(meeting_date),
        settings.history,
        &settings.matcher,
        &SilentProgress,
    )
    .await;

    if json {
        let items = ReconciledItems {
            open: result.historical_open_items,
            closed: result.historical_closed_items,
        };
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!();
    println!(
        "  History before {meeting_date}: {} document(s)",
        result.files_count
    );
    print_items("Open", &result.historical_open_items);
    print_items("Completed", &result.historical_closed_items);
    println!();

    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_report(output: &PipelineOutput) {
    println!();
    if output.summary_valid && output.insights_valid {
        println!("  Meeting processed successfully!");
    } else {
        println!("  Meeting processed with best-effort output (generation stayed too short).");
    }
    println!("  History:   {} earlier document(s)", output.history_files);
    println!("  Carried:   {} open item(s)", output.carried_forward.len());
    println!("  Tokens:    {}", output.tokens_used);
}

fn print_items(label: &str, items: &[String]) {
    println!();
    println!("  {label} ({}):", items.len());
    for item in items {
        println!("    - {item}");
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn message(&self, msg: &str) {
        self.spinner.set_message(msg.to_string());
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: PipelineStage) {
        self.message(stage.label());
    }

    fn done(&self, _output: &PipelineOutput) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
