//! docpress CLI — static documentation site builder.
//!
//! Renders a markdown content tree into JSON page payloads plus the
//! navigation manifests a frontend serves directly.

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
