//! Error types for sqlfan.
//!
//! Defines the main error enum used throughout the application. Every
//! variant carries a plain message so errors can be cloned into the
//! per-statement outcomes that outlive the connection that produced them.

use thiserror::Error;

/// Main error type for sqlfan operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlfanError {
    /// Endpoint unreachable or unhealthy (open or ping failed).
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed on a healthy connection.
    #[error("Query error: {0}")]
    Query(String),

    /// A single row could not be decoded.
    #[error("Row decode error: {0}")]
    RowDecode(String),

    /// Column metadata for a result set could not be read.
    #[error("Column error: {0}")]
    Columns(String),

    /// A concurrent worker failed outside of the normal error paths.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Configuration errors (invalid config file, bad flags, invalid DSN, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Statement or server list input could not be read.
    #[error("Input error: {0}")]
    Input(String),

    /// Writing results to the terminal failed.
    #[error("Output error: {0}")]
    Output(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SqlfanError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a row decode error with the given message.
    pub fn row_decode(msg: impl Into<String>) -> Self {
        Self::RowDecode(msg.into())
    }

    /// Creates a column retrieval error with the given message.
    pub fn columns(msg: impl Into<String>) -> Self {
        Self::Columns(msg.into())
    }

    /// Creates a worker failure with the given message.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an input error with the given message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true for errors that take down a whole endpoint rather than
    /// a single statement.
    pub fn is_endpoint_level(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Worker(_))
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::RowDecode(_) => "Row Decode Error",
            Self::Columns(_) => "Column Error",
            Self::Worker(_) => "Worker Error",
            Self::Config(_) => "Configuration Error",
            Self::Input(_) => "Input Error",
            Self::Output(_) => "Output Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

impl From<std::io::Error> for SqlfanError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(err.to_string())
    }
}

/// Result type alias using SqlfanError.
pub type Result<T> = std::result::Result<T, SqlfanError>;
