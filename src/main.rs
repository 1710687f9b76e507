//! agentic-rag CLI entry point.

#![allow(clippy::print_stdout)]

use agentic_rag::cli::{Cli, execute};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "agentic_rag=debug"
    } else {
        "agentic_rag=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = execute(&cli).context("agentic-rag failed")?;
    if !output.is_empty() {
        print!("{output}");
    }
    Ok(())
}
