//! Mock database connector for testing.
//!
//! Provides an in-memory, scriptable stand-in for a fleet of MySQL servers so
//! the executor and coordinator can be tested headless. Each endpoint string
//! can be given its own behavior: failing connects or pings, slow connects,
//! crashing workers, failing statements and canned result sets.

use super::{Connector, DatabaseClient, Row, RowCursor, Value};
use crate::dsn::Endpoint;
use crate::error::{Result, SqlfanError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A canned result set for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockResult {
    pub columns: Vec<String>,
    /// Rows in order; `Err` entries fail to decode with the given message.
    pub rows: Vec<std::result::Result<Row, String>>,
    /// If set, reading the column names fails with this message.
    pub column_error: Option<String>,
}

impl MockResult {
    /// A result set with the given columns and rows.
    pub fn rows(columns: &[&str], rows: Vec<Row>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.into_iter().map(Ok).collect(),
            column_error: None,
        }
    }

    /// A statement that returns no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Appends a row that fails to decode.
    pub fn with_bad_row(mut self, message: impl Into<String>) -> Self {
        self.rows.push(Err(message.into()));
        self
    }

    /// A result whose column names cannot be read.
    pub fn column_error(message: impl Into<String>) -> Self {
        Self {
            column_error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Scripted behavior of one mock endpoint.
#[derive(Debug, Clone, Default)]
pub struct MockEndpoint {
    connect_error: Option<String>,
    ping_error: Option<String>,
    delay: Duration,
    panics: bool,
    failing: HashMap<String, String>,
    results: HashMap<String, MockResult>,
}

impl MockEndpoint {
    /// A healthy endpoint with default results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes connecting fail.
    pub fn connect_error(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Makes the liveness check fail.
    pub fn ping_error(mut self, message: impl Into<String>) -> Self {
        self.ping_error = Some(message.into());
        self
    }

    /// Delays connecting by `delay`.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes the worker panic while connecting.
    pub fn panics(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Makes `sql` fail with `message`.
    pub fn fail_statement(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.failing.insert(sql.into(), message.into());
        self
    }

    /// Makes `sql` return `result`.
    pub fn result(mut self, sql: impl Into<String>, result: MockResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }
}

/// Bookkeeping shared by all clients of one connector.
#[derive(Debug, Default)]
struct MockState {
    open_cursors: AtomicUsize,
    closed: AtomicUsize,
    executed: Mutex<Vec<(String, String)>>,
}

/// A connector whose endpoints behave as scripted.
///
/// Endpoints without a script connect fine. A `SELECT` returns one row
/// echoing the statement; anything else returns no columns.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    endpoints: HashMap<String, MockEndpoint>,
    state: Arc<MockState>,
}

impl MockConnector {
    /// Creates a connector where every endpoint is healthy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the behavior of `endpoint`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>, behavior: MockEndpoint) -> Self {
        self.endpoints.insert(endpoint.into(), behavior);
        self
    }

    /// Statements executed so far as `(endpoint, statement)`, in execution order.
    pub fn executed(&self) -> Vec<(String, String)> {
        self.state
            .executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of cursors that have not been dropped yet.
    pub fn open_cursors(&self) -> usize {
        self.state.open_cursors.load(Ordering::SeqCst)
    }

    /// Number of connections closed so far.
    pub fn closed_connections(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn DatabaseClient>> {
        let behavior = self
            .endpoints
            .get(endpoint.as_str())
            .cloned()
            .unwrap_or_default();

        if !behavior.delay.is_zero() {
            tokio::time::sleep(behavior.delay).await;
        }
        if behavior.panics {
            panic!("mock endpoint {} crashed", endpoint.as_str());
        }
        if let Some(message) = &behavior.connect_error {
            return Err(SqlfanError::connection(format!(
                "failed to open connection: {message}"
            )));
        }

        Ok(Box::new(MockClient {
            endpoint: endpoint.as_str().to_string(),
            behavior,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockClient {
    endpoint: String,
    behavior: MockEndpoint,
    state: Arc<MockState>,
}

impl MockClient {
    fn result_for(&self, sql: &str) -> MockResult {
        self.behavior
            .results
            .get(sql)
            .cloned()
            .unwrap_or_else(|| Self::default_result(sql))
    }

    fn default_result(sql: &str) -> MockResult {
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            MockResult::rows(
                &["result"],
                vec![vec![Value::Text(format!("Mock result for: {sql}"))]],
            )
        } else {
            MockResult::empty()
        }
    }
}

#[async_trait]
impl DatabaseClient for MockClient {
    async fn ping(&mut self) -> Result<()> {
        match &self.behavior.ping_error {
            Some(message) => Err(SqlfanError::connection(format!(
                "failed to ping database: {message}"
            ))),
            None => Ok(()),
        }
    }

    async fn query<'a>(&'a mut self, sql: &'a str) -> Result<Box<dyn RowCursor + 'a>> {
        self.state
            .executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((self.endpoint.clone(), sql.to_string()));

        if let Some(message) = self.behavior.failing.get(sql) {
            return Err(SqlfanError::query(message.clone()));
        }

        let result = self.result_for(sql);

        self.state.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCursor {
            // Like the text protocol, column names only travel with rows.
            columns: match result.column_error {
                Some(message) => Err(SqlfanError::columns(message)),
                None if result.rows.is_empty() => Ok(Vec::new()),
                None => Ok(result.columns),
            },
            rows: result.rows.into(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn describe_columns(&mut self, sql: &str) -> Result<Vec<String>> {
        if let Some(message) = self.behavior.failing.get(sql) {
            return Err(SqlfanError::columns(message.clone()));
        }
        Ok(self.result_for(sql).columns)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockCursor {
    columns: Result<Vec<String>>,
    rows: VecDeque<std::result::Result<Row, String>>,
    state: Arc<MockState>,
}

#[async_trait]
impl RowCursor for MockCursor {
    fn columns(&self) -> Result<Vec<String>> {
        self.columns.clone()
    }

    async fn next_row(&mut self) -> Option<Result<Row>> {
        self.rows
            .pop_front()
            .map(|row| row.map_err(SqlfanError::row_decode))
    }
}

impl Drop for MockCursor {
    fn drop(&mut self) {
        self.state.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
