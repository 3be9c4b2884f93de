//! toolvault CLI — archive loose scripts and document them in a note vault.
//!
//! Copies new scripts from a working directory into a flat archive and
//! writes one Markdown note per script, filed by keyword category.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
