//! Environment-sourced configuration.
//!
//! Everything is read once, up front, into explicit values that are handed to
//! the fetcher and the store. A variable set to an empty string counts as
//! missing.

use std::fmt::{Debug, Formatter};

use ticksink_warehouse::PostgresConfig;

use crate::{ConfigError, Symbol};

pub const API_KEY_VAR: &str = "ALPHA_VANTAGE_API_KEY";
pub const SYMBOL_VAR: &str = "STOCK_SYMBOL";
pub const POSTGRES_DB_VAR: &str = "POSTGRES_DB";
pub const POSTGRES_USER_VAR: &str = "POSTGRES_USER";
pub const POSTGRES_PASSWORD_VAR: &str = "POSTGRES_PASSWORD";

pub const DEFAULT_SYMBOL: &str = "IBM";
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Market-data API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ConfigError::MissingVar { name: API_KEY_VAR });
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Settings for the intraday-series fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl FetcherConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// What one run fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub fetcher: FetcherConfig,
    pub symbol: Symbol,
}

impl PipelineConfig {
    /// Read the fetch settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Read the fetch settings through `lookup`.
    ///
    /// The API key is checked first so a missing credential fails before
    /// anything else is attempted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = ApiKey::new(required(&lookup, API_KEY_VAR)?)?;
        let symbol = symbol_from_lookup(&lookup)?;

        Ok(Self {
            fetcher: FetcherConfig::new(api_key),
            symbol,
        })
    }
}

/// The configured symbol, or `IBM` when unset.
pub fn symbol_from_env() -> Result<Symbol, ConfigError> {
    symbol_from_lookup(env_lookup)
}

pub fn symbol_from_lookup<F>(lookup: F) -> Result<Symbol, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = optional(&lookup, SYMBOL_VAR).unwrap_or_else(|| String::from(DEFAULT_SYMBOL));
    parse_symbol(&raw)
}

/// Parse a symbol supplied by configuration or a command-line argument.
pub fn parse_symbol(raw: &str) -> Result<Symbol, ConfigError> {
    Symbol::parse(raw).map_err(|source| ConfigError::InvalidSymbol {
        value: raw.to_owned(),
        source,
    })
}

/// Read the PostgreSQL credentials from the process environment.
pub fn postgres_config_from_env() -> Result<PostgresConfig, ConfigError> {
    postgres_config_from_lookup(env_lookup)
}

/// Read the PostgreSQL credentials through `lookup`. Host and port keep their
/// fixed defaults.
pub fn postgres_config_from_lookup<F>(lookup: F) -> Result<PostgresConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let database = required(&lookup, POSTGRES_DB_VAR)?;
    let user = required(&lookup, POSTGRES_USER_VAR)?;
    let password = required(&lookup, POSTGRES_PASSWORD_VAR)?;
    Ok(PostgresConfig::new(database, user, password))
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::MissingVar { name })
}
