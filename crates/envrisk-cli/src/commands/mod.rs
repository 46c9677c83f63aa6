//! Command implementations

mod config;
mod layers;
mod query;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    match &cli.command {
        Commands::Query(args) => query::execute(&cli, args, &output),
        Commands::Layers => layers::execute(&cli, &output),
        Commands::Config => config::execute(&cli, &output),
    }
}
