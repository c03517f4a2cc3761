mod latest;
mod run;
mod schedule;
mod schema;

use std::sync::Arc;

use serde_json::Value;
use ticksink_core::{Pipeline, PipelineConfig, ReqwestHttpClient};

use crate::backend::Backend;
use crate::cli::{Cli, Command};
use crate::error::CliError;

/// What a command hands back for rendering.
#[derive(Debug)]
pub enum CommandOutput {
    Json(Value),
    Text(String),
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    match &cli.command {
        Command::Run(args) => run::run(cli, args).await,
        Command::Schedule(args) => schedule::run(cli, args).await,
        Command::Latest(args) => latest::run(cli, args).await,
        Command::Schema(args) => Ok(schema::run(args)),
    }
}

/// Build the production pipeline for the selected store.
///
/// Fetch settings are validated before the store is opened, so a missing API
/// key is reported ahead of missing database credentials.
fn build_pipeline(cli: &Cli) -> Result<Pipeline, CliError> {
    let config = PipelineConfig::from_env()?;
    let backend = Backend::open(cli)?;
    Ok(Pipeline::from_config(
        config,
        Arc::new(ReqwestHttpClient::new()),
        backend.quote_store(),
    ))
}
