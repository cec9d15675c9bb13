//! Per-statement, per-endpoint execution records.

use std::time::Duration;

use crate::db::Row;
use crate::dsn::Endpoint;
use crate::error::SqlfanError;

use super::splitter::StatementUnit;

/// The result of running one statement on one endpoint, or the single
/// record that stands in for an endpoint that never became usable.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Endpoint the statement ran on.
    pub endpoint: Endpoint,

    /// Statement as written, `\G` included. Empty for endpoint-level failures.
    pub statement: String,

    /// Column names, in result order.
    pub columns: Vec<String>,

    /// Rows, in result order. Empty whenever `columns` could not be read.
    pub rows: Vec<Row>,

    /// First error met while running the statement.
    pub error: Option<SqlfanError>,

    /// Time spent executing, when captured.
    pub duration: Option<Duration>,

    /// Number of rows collected, when captured.
    pub row_count: Option<usize>,

    /// True if the statement asked for vertical output.
    pub vertical: bool,
}

impl ExecutionOutcome {
    /// Creates an empty outcome for `statement` on `endpoint`.
    pub fn for_statement(endpoint: &Endpoint, statement: &StatementUnit) -> Self {
        Self {
            endpoint: endpoint.clone(),
            statement: statement.display_text(),
            columns: Vec::new(),
            rows: Vec::new(),
            error: None,
            duration: None,
            row_count: None,
            vertical: statement.vertical,
        }
    }

    /// Creates the single outcome reported for an endpoint that failed as a
    /// whole (connect, ping, or a crashed worker).
    pub fn endpoint_failure(endpoint: &Endpoint, error: SqlfanError) -> Self {
        Self {
            endpoint: endpoint.clone(),
            statement: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            error: Some(error),
            duration: None,
            row_count: None,
            vertical: false,
        }
    }

    /// Records `error` unless an earlier one is already recorded.
    pub fn record_error(&mut self, error: SqlfanError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Returns true if this outcome carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns true if this is an endpoint-level failure record.
    pub fn is_endpoint_failure(&self) -> bool {
        self.error.as_ref().is_some_and(SqlfanError::is_endpoint_level)
    }
}

/// All outcomes of one endpoint, tagged with its position in the input list.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointReport {
    pub index: usize,
    pub endpoint: Endpoint,
    pub outcomes: Vec<ExecutionOutcome>,
}
