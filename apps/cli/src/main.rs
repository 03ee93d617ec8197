//! discusskit CLI: batch download of item discussions and per-group bundles.
//!
//! `fetch` materializes one artifact per catalog item; `merge` folds existing
//! artifacts into tag and company bundles.

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
