use std::time::Duration;

use serde::Serialize;
use ticksink_core::{PipelineError, RunOutcome};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::cli::{Cli, ScheduleArgs};
use crate::error::CliError;
use crate::retry::RetryConfig;

use super::{build_pipeline, CommandOutput};

#[derive(Debug, Default, Serialize)]
struct ScheduleSummary {
    runs: u64,
    stored: u64,
    no_data: u64,
    failed: u64,
}

pub async fn run(cli: &Cli, args: &ScheduleArgs) -> Result<CommandOutput, CliError> {
    let pipeline = build_pipeline(cli)?;
    let retry = RetryConfig::fixed(Duration::from_secs(args.retry_delay_secs), args.retries);

    let mut ticker = tokio::time::interval(Duration::from_secs(args.every_secs));
    // A run that overran its slot does not trigger a burst of catch-up runs.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        symbol = %pipeline.symbol(),
        every_secs = args.every_secs,
        retries = args.retries,
        retry_delay_secs = args.retry_delay_secs,
        "scheduler started"
    );

    let mut summary = ScheduleSummary::default();
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }

        summary.runs += 1;
        match retry
            .run(|| pipeline.run_once(), PipelineError::is_retryable)
            .await
        {
            Ok(RunOutcome::Stored { .. }) => summary.stored += 1,
            Ok(RunOutcome::NoData { .. }) => summary.no_data += 1,
            Err(cause) => {
                summary.failed += 1;
                error!(stage = cause.stage(), cause = %cause, "scheduled run failed");
            }
        }

        if args.max_runs.is_some_and(|max| summary.runs >= max) {
            break;
        }
    }

    info!(
        runs = summary.runs,
        stored = summary.stored,
        no_data = summary.no_data,
        failed = summary.failed,
        "scheduler stopped"
    );
    Ok(CommandOutput::Json(serde_json::to_value(&summary)?))
}
