//! HealthDigest CLI: turns parsed medical documents into a patient profile
//! and categorized lifestyle recommendations.
//!
//! Documents are read from disk in upload order, merged into one profile,
//! and rendered as Markdown or JSON.

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
