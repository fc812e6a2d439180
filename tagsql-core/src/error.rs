//! Error types for tagsql

use thiserror::Error;

/// Misconfiguration recorded on a statement builder while it is being chained.
///
/// Builders keep the first one of these and ignore every later clause, so the
/// error is cheap to clone and compare.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// SELECT without any FROM table
    #[error("No tables used")]
    NoTablesUsed,

    /// INSERT without an INTO table
    #[error("No table to insert into")]
    NoIntoTable,

    /// UPDATE without SET columns
    #[error("No columns to set")]
    NoSetColumns,

    /// `set_all` on an UPDATE spanning several tables
    #[error("set_all cannot be used on a multi-table UPDATE, columns must be qualified")]
    InappropriateSetAllUsage,
}

/// The main error type for tagsql operations
#[derive(Error, Debug)]
pub enum Error {
    /// The builder was misconfigured before execution
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] BuildError),

    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement failed; carries the SQL text for context
    #[error("Statement `{sql}` failed: {source}")]
    Statement {
        sql: String,
        #[source]
        source: Box<Error>,
    },

    /// A scanned value could not be converted into the target field type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A column value could not be decoded or scanned
    #[error("Cannot decode column '{column}': {source}")]
    Decode {
        column: String,
        #[source]
        source: Box<Error>,
    },

    /// The row and the scan destinations disagree on the column count
    #[error("Expected {expected} destination arguments in scan, found {found}")]
    ColumnCount { expected: usize, found: usize },

    /// A cursor was scanned before it was advanced onto a row
    #[error("Scan called without a current row")]
    NoCurrentRow,

    /// A column required by the statement is not tagged on the record
    #[error("Column '{column}' not found in record '{record}'")]
    ColumnNotFound { record: String, column: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid connection configuration
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Convenience Result type for tagsql operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error with the statement that produced it
    pub fn statement(sql: impl Into<String>, source: Error) -> Self {
        Self::Statement {
            sql: sql.into(),
            source: Box::new(source),
        }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    /// Wrap a conversion failure with the column it happened on
    pub fn decode(column: impl Into<String>, source: Error) -> Self {
        Self::Decode {
            column: column.into(),
            source: Box::new(source),
        }
    }

    /// Create a new column not found error
    pub fn column_not_found(record: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            record: record.into(),
            column: column.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The builder error behind this error, looking through statement context
    pub fn build_error(&self) -> Option<&BuildError> {
        match self {
            Self::InvalidQuery(err) => Some(err),
            Self::Statement { source, .. } => source.build_error(),
            _ => None,
        }
    }
}
