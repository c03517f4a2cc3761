use ticksink_core::{run_from_env, RunOutcome};

use crate::cli::{Cli, RunArgs, StoreKind};
use crate::error::CliError;

use super::{build_pipeline, CommandOutput};

pub async fn run(cli: &Cli, args: &RunArgs) -> Result<CommandOutput, CliError> {
    let outcome = match cli.store {
        StoreKind::Postgres => run_from_env().await?,
        StoreKind::DuckDb => build_pipeline(cli)?.run_once().await?,
    };

    if args.json {
        return Ok(CommandOutput::Json(serde_json::to_value(&outcome)?));
    }

    let line = match &outcome {
        RunOutcome::Stored { quote } => format!(
            "stored {} {} close={} volume={}",
            quote.symbol, quote.timestamp, quote.close, quote.volume
        ),
        RunOutcome::NoData { symbol } => format!("no data for {symbol}"),
    };
    Ok(CommandOutput::Text(line))
}
