//! singlehtml CLI — Markdown to a single self-contained HTML file.
//!
//! Renders Markdown, inlines every stylesheet and image, strips scripts,
//! and optionally adds a navigation sidebar.

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
