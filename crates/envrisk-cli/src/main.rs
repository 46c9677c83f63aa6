//! envrisk CLI
//!
//! Loads the layers named in the manifest once, then answers one command.

mod cli;
mod commands;
mod errors;
mod loader;
mod output;
mod output_types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use errors::CliError;

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable with --json
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = commands::execute(cli) {
        if let Some(cli_error) = err.downcast_ref::<CliError>() {
            cli_error.display();
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}
