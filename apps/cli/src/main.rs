//! Recap CLI — meeting summaries with deeper insights that carry open items forward.
//!
//! Transcribes recorded meetings, summarizes them, and reconciles the
//! resulting action items against earlier meetings.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
