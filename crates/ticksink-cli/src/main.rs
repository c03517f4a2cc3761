mod backend;
mod cli;
mod commands;
mod error;
mod retry;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::CommandOutput;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let output = commands::run(&cli).await?;

    let mut stdout = std::io::stdout().lock();
    match output {
        CommandOutput::Json(value) if cli.pretty => {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        CommandOutput::Json(value) => writeln!(stdout, "{value}")?,
        CommandOutput::Text(text) => writeln!(stdout, "{text}")?,
    }
    Ok(())
}
