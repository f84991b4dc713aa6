//! Error types for Quarry

use thiserror::Error;

/// The main error type for Quarry operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or execution error raised by the sqlx adapter
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Execution error raised by any other executor
    #[error("Execution error: {message}")]
    Execution { message: String },

    /// A single-row destination was requested but the query returned nothing
    #[error("no rows in result set")]
    NoRows,

    /// A column value could not be stored in its bound field
    #[error("cannot scan column '{column}': {source}")]
    Scan {
        column: String,
        #[source]
        source: Box<Error>,
    },

    /// A value could not be converted into the requested native type
    #[error("cannot convert {found} into {expected}")]
    Conversion {
        expected: &'static str,
        found: String,
    },

    /// A row carried a different number of values than the cursor has columns
    #[error("row has {found} values but the result set has {expected} columns")]
    ColumnCount { expected: usize, found: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unknown driver name or connection URL scheme
    #[error("Unsupported driver '{name}'")]
    UnsupportedDriver { name: String },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },
}

/// Convenience Result type for Quarry operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a conversion error from the expected type and a description of what was found
    pub fn conversion(expected: &'static str, found: impl Into<String>) -> Self {
        Self::Conversion {
            expected,
            found: found.into(),
        }
    }

    /// Wrap a conversion failure with the column it happened on
    pub fn scan(column: impl Into<String>, source: Error) -> Self {
        Self::Scan {
            column: column.into(),
            source: Box::new(source),
        }
    }

    /// Create an unsupported driver error
    pub fn unsupported_driver(name: impl Into<String>) -> Self {
        Self::UnsupportedDriver { name: name.into() }
    }

    /// Whether this error means "the query matched nothing"
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }
}
