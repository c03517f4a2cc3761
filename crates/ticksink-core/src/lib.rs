//! # Ticksink Core
//!
//! Fetches the latest hourly bar for one equity symbol and hands it to an
//! idempotent store.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Alpha Vantage intraday-series fetcher |
//! | [`config`] | Environment-sourced settings |
//! | [`data_source`] | Fetch outcome and error types |
//! | [`domain`] | `Symbol` and `Quote` value types |
//! | [`error`] | Validation and configuration errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`pipeline`] | One fetch-then-store run |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     match ticksink_core::run_from_env().await? {
//!         ticksink_core::RunOutcome::Stored { quote } => println!("stored {}", quote.timestamp),
//!         ticksink_core::RunOutcome::NoData { symbol } => println!("no data for {symbol}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Run flow
//!
//! ```text
//! ┌─────────────────┐
//! │  Scheduler/CLI  │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ AlphaVantage    │────▶│ HTTP Client      │
//! │ Fetcher         │     │ (reqwest/static) │
//! └────────┬────────┘     └──────────────────┘
//!          ▼ Quote | NoData
//! ┌─────────────────┐
//! │ QuoteStore      │  (PostgreSQL or DuckDB)
//! └─────────────────┘
//! ```
//!
//! ## Security
//!
//! - The API key is redacted from `Debug` output and from logged URLs
//! - Database passwords are redacted from `Debug` output
//! - All HTTP requests use TLS via rustls

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod pipeline;

pub use adapters::{parse_intraday_response, AlphaVantageFetcher};

pub use config::{ApiKey, FetcherConfig, PipelineConfig};

pub use data_source::{FetchError, FetchOutcome};

pub use domain::{Quote, Symbol};

pub use error::{ConfigError, ValidationError};

pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
};

pub use pipeline::{run_from_env, Pipeline, PipelineError, RunOutcome};

// Warehouse (re-exported from ticksink-warehouse)
pub use ticksink_warehouse::{
    Dialect, DuckDbStore, PostgresConfig, PostgresStore, QuoteRecord, QuoteStore, StoreError,
    StoredQuote,
};
