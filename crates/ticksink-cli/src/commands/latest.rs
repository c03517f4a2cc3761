use ticksink_core::config::{parse_symbol, symbol_from_env};

use crate::backend::Backend;
use crate::cli::{Cli, LatestArgs};
use crate::error::CliError;

use super::CommandOutput;

pub async fn run(cli: &Cli, args: &LatestArgs) -> Result<CommandOutput, CliError> {
    let symbol = match &args.symbol {
        Some(raw) => parse_symbol(raw)?,
        None => symbol_from_env()?,
    };
    let backend = Backend::open(cli)?;
    let stored = backend.latest_quote(symbol.as_str()).await?;

    Ok(CommandOutput::Json(serde_json::to_value(stored)?))
}
