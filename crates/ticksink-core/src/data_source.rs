//! Fetcher contract: outcome and error types.
//!
//! A fetch either yields a [`Quote`], reports that the provider had nothing to
//! offer ([`FetchOutcome::NoData`]), or fails with a [`FetchError`] that tells
//! transient transport problems apart from malformed responses.

use thiserror::Error;

use crate::Quote;

/// Successful result of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Quote(Quote),
    /// The response was valid but carried no observations.
    NoData,
}

impl FetchOutcome {
    pub fn into_quote(self) -> Option<Quote> {
        match self {
            Self::Quote(quote) => Some(quote),
            Self::NoData => None,
        }
    }
}

/// Fetch failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or non-success HTTP status.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status, when the server answered.
        status: Option<u16>,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Transport failures may clear up on their own; parse failures will not.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Parse(_) => "parse",
        }
    }
}
