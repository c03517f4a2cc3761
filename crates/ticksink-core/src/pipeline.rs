//! The ingestion run: fetch the latest observation, then persist it.
//!
//! A run is strictly sequential. Every failure is logged here, at the run
//! boundary, with the stage it came from, and then returned unchanged so the
//! caller's retry policy can act on it. Nothing in this module retries.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use ticksink_warehouse::{PostgresStore, QuoteRecord, QuoteStore, StoreError};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::adapters::AlphaVantageFetcher;
use crate::config::{postgres_config_from_env, PipelineConfig};
use crate::data_source::{FetchError, FetchOutcome};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{ConfigError, Quote, Symbol};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A quote was fetched and upserted.
    Stored { quote: Quote },
    /// The provider had no observations; nothing was written.
    NoData { symbol: Symbol },
}

/// A failed run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Stage of the run that failed.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Fetch(_) => "fetch",
            Self::Store(_) => "store",
        }
    }

    /// Whether a later attempt of the same run could succeed.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Fetch(error) => error.is_retryable(),
            Self::Store(error) => !matches!(error, StoreError::Constraint(_)),
        }
    }
}

/// One configured fetch-then-store pipeline.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: AlphaVantageFetcher,
    store: Arc<dyn QuoteStore>,
    symbol: Symbol,
}

impl Pipeline {
    pub fn new(fetcher: AlphaVantageFetcher, store: Arc<dyn QuoteStore>, symbol: Symbol) -> Self {
        Self {
            fetcher,
            store,
            symbol,
        }
    }

    pub fn from_config(
        config: PipelineConfig,
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn QuoteStore>,
    ) -> Self {
        let fetcher = AlphaVantageFetcher::new(http_client, config.fetcher);
        Self::new(fetcher, store, config.symbol)
    }

    /// Build a pipeline from variables resolved through `lookup`.
    ///
    /// Configuration is validated before the pipeline exists, so a missing
    /// API key can never reach the network.
    pub fn from_lookup<F>(
        lookup: F,
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn QuoteStore>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = PipelineConfig::from_lookup(lookup)?;
        Ok(Self::from_config(config, http_client, store))
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn fetcher(&self) -> &AlphaVantageFetcher {
        &self.fetcher
    }

    /// Execute one run.
    pub async fn run_once(&self) -> Result<RunOutcome, PipelineError> {
        let span = info_span!(
            "pipeline_run",
            run_id = %Uuid::new_v4(),
            symbol = %self.symbol,
            store = self.store.dialect().as_str(),
        );
        self.execute().instrument(span).await
    }

    async fn execute(&self) -> Result<RunOutcome, PipelineError> {
        let quote = match self.fetcher.fetch_latest_quote(&self.symbol).await {
            Ok(FetchOutcome::Quote(quote)) => quote,
            Ok(FetchOutcome::NoData) => {
                info!("provider returned no observations; nothing to store");
                return Ok(RunOutcome::NoData {
                    symbol: self.symbol.clone(),
                });
            }
            Err(cause) => {
                error!(stage = "fetch", kind = cause.kind(), cause = %cause, "run failed");
                return Err(cause.into());
            }
        };

        let record = QuoteRecord::from(&quote);
        if let Err(cause) = self.store.upsert_quote(&record).await {
            error!(stage = "store", kind = cause.kind(), cause = %cause, "run failed");
            return Err(cause.into());
        }

        info!(
            timestamp = %record.timestamp,
            close = %quote.close,
            volume = quote.volume,
            "quote stored"
        );
        Ok(RunOutcome::Stored { quote })
    }
}

/// Zero-argument entrypoint: read the environment, fetch over HTTPS and write
/// to PostgreSQL.
pub async fn run_from_env() -> Result<RunOutcome, PipelineError> {
    let pipeline = match pipeline_from_env() {
        Ok(pipeline) => pipeline,
        Err(cause) => {
            error!(stage = "config", cause = %cause, "run failed");
            return Err(cause.into());
        }
    };
    pipeline.run_once().await
}

fn pipeline_from_env() -> Result<Pipeline, ConfigError> {
    let config = PipelineConfig::from_env()?;
    let database = postgres_config_from_env()?;
    let store: Arc<dyn QuoteStore> = Arc::new(PostgresStore::new(&database));
    Ok(Pipeline::from_config(
        config,
        Arc::new(ReqwestHttpClient::new()),
        store,
    ))
}
