use thiserror::Error;
use ticksink_core::{ConfigError, FetchError, PipelineError};
use ticksink_warehouse::StoreError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for CliError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Config(error) => Self::Config(error),
            PipelineError::Fetch(error) => Self::Fetch(error),
            PipelineError::Store(error) => Self::Store(error),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Fetch(FetchError::Transport { .. }) => 3,
            Self::Fetch(FetchError::Parse(_)) => 4,
            Self::Store(_) => 5,
            Self::Serialization(_) => 10,
            Self::Io(_) => 10,
        }
    }
}
