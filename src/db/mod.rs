//! Database abstraction layer for sqlfan.
//!
//! Provides a trait-based interface for the handful of operations the
//! executor needs (connect, ping, query, fetch rows, fetch column names), so
//! the MySQL driver and the scripted mock can be used interchangeably.

mod mock;
mod mysql;
mod types;

pub use mock::{MockConnector, MockEndpoint, MockResult};
pub use mysql::{MySqlClient, MySqlConnector};
pub use types::{Row, Value};

use crate::dsn::Endpoint;
use crate::error::Result;
use async_trait::async_trait;

/// Opens connections to endpoints.
///
/// Shared by every worker of a run, so it must be `Send + Sync`.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens one connection to `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn DatabaseClient>>;
}

/// One open connection, owned by exactly one worker.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Checks that the connection is alive.
    async fn ping(&mut self) -> Result<()>;

    /// Executes `sql` and returns a cursor over its result set.
    ///
    /// The cursor borrows the connection, so the next statement can only run
    /// once the previous cursor has been dropped.
    async fn query<'a>(&'a mut self, sql: &'a str) -> Result<Box<dyn RowCursor + 'a>>;

    /// Returns the column names `sql` would produce, without running it.
    ///
    /// Used for result sets that came back without rows, since the text
    /// protocol only carries column names alongside rows.
    async fn describe_columns(&mut self, sql: &str) -> Result<Vec<String>>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Rows of a single statement's result set.
#[async_trait]
pub trait RowCursor: Send {
    /// Returns the column names of the result set.
    fn columns(&self) -> Result<Vec<String>>;

    /// Returns the next row, `Some(Err(_))` for a row that could not be read,
    /// or `None` once the result set is exhausted.
    async fn next_row(&mut self) -> Option<Result<Row>>;
}
