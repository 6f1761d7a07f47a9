use anyhow::Result;
use clap::Parser;

use bmssp::cli::{self, Cli};

fn main() -> Result<()> {
    cli::run(Cli::parse())
}
