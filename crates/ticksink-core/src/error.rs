use thiserror::Error;

/// Validation errors raised while constructing domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("field '{field}' does not fit DECIMAL(10, 4)")]
    PriceOutOfRange { field: &'static str },
    #[error("volume {value} does not fit a signed 64-bit integer")]
    VolumeOutOfRange { value: u64 },
}

/// Configuration errors. These are raised before any network or database I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    MissingVar { name: &'static str },

    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    #[error("invalid symbol '{value}': {source}")]
    InvalidSymbol {
        value: String,
        #[source]
        source: ValidationError,
    },
}
