//! tenderlens CLI: scrape government procurement portals into structured JSON.
//!
//! Every scrape command prints a single JSON envelope on stdout. Progress and
//! logs go to stderr.

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
