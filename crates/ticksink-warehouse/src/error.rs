use thiserror::Error;

/// Failures raised while persisting or reading quotes.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be reached or opened.
    #[error("database connection error: {0}")]
    Connection(String),

    /// A statement was rejected by a table constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Any other statement failure after the connection succeeded.
    #[error("write failed: {0}")]
    Write(String),
}

impl StoreError {
    pub fn connection(error: impl std::fmt::Display) -> Self {
        Self::Connection(error.to_string())
    }

    pub fn write(error: impl std::fmt::Display) -> Self {
        Self::Write(error.to_string())
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Constraint(_) => "constraint",
            Self::Write(_) => "write",
        }
    }
}

/// Classify a `sqlx` error raised by a statement on an open connection.
pub(crate) fn classify_sqlx(error: sqlx::Error) -> StoreError {
    use sqlx::error::ErrorKind;

    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::connection(&error),
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StoreError::Constraint(db.message().to_owned()),
            _ => StoreError::write(&error),
        },
        _ => StoreError::write(&error),
    }
}

/// Classify a `DuckDB` error raised by a statement on an open connection.
pub(crate) fn classify_duckdb(error: ::duckdb::Error) -> StoreError {
    let message = error.to_string();
    if message.contains("Constraint Error") {
        StoreError::Constraint(message)
    } else {
        StoreError::Write(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeouts_are_connection_failures() {
        let error = classify_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, StoreError::Connection(_)));
        assert_eq!(error.kind(), "connection");
    }

    #[test]
    fn missing_rows_are_generic_write_failures() {
        let error = classify_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(error, StoreError::Write(_)));
    }
}
