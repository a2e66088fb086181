//! Command implementations

mod check;
mod explore;
mod inspect;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Check(args) => check::execute(args, config, &output),
        Commands::Explore(args) => explore::execute(args, config, &output),
        Commands::Inspect(args) => inspect::execute(args, config, &output),
    }
}
