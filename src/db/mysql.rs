//! MySQL database client implementation.
//!
//! Provides `MySqlConnector` and `MySqlClient`, the sqlx-backed implementation
//! of the database traits. Statements go over the text protocol
//! (`sqlx::raw_sql`), so anything the server accepts can be run, including
//! statements that can't be prepared.

use crate::db::{Connector, DatabaseClient, Row, RowCursor, Value};
use crate::dsn::Endpoint;
use crate::error::{Result, SqlfanError};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::{Column as SqlxColumn, Connection, Executor, Row as SqlxRow, Statement, TypeInfo};
use tracing::debug;

/// Opens one dedicated MySQL connection per endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn DatabaseClient>> {
        let options = endpoint
            .dsn()
            .and_then(|dsn| dsn.connect_options())
            .map_err(|e| SqlfanError::connection(format!("failed to open connection: {e}")))?;

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| SqlfanError::connection(format!("failed to open connection: {e}")))?;

        debug!(endpoint = %endpoint.masked(), "connected");
        Ok(Box::new(MySqlClient::from_connection(conn)))
    }
}

/// A single MySQL connection.
#[derive(Debug)]
pub struct MySqlClient {
    conn: MySqlConnection,
}

impl MySqlClient {
    /// Wraps an already established connection.
    pub fn from_connection(conn: MySqlConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn ping(&mut self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| SqlfanError::connection(format!("failed to ping database: {e}")))
    }

    async fn query<'a>(&'a mut self, sql: &'a str) -> Result<Box<dyn RowCursor + 'a>> {
        let mut stream = sqlx::raw_sql(sql).fetch(&mut self.conn);

        // The server reports statement errors before the first row, so
        // polling once separates "statement failed" from "row failed".
        let first = stream
            .try_next()
            .await
            .map_err(|e| SqlfanError::query(format_query_error(&e)))?;

        Ok(Box::new(MySqlCursor::new(stream, first)))
    }

    async fn describe_columns(&mut self, sql: &str) -> Result<Vec<String>> {
        let statement = (&mut self.conn)
            .prepare(sql)
            .await
            .map_err(|e| SqlfanError::columns(format!("failed to describe statement: {e}")))?;

        Ok(statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let MySqlClient { conn } = *self;
        conn.close()
            .await
            .map_err(|e| SqlfanError::connection(format!("failed to close connection: {e}")))
    }
}

/// Cursor over one statement's rows, borrowing the connection.
struct MySqlCursor<'a> {
    stream: BoxStream<'a, std::result::Result<MySqlRow, sqlx::Error>>,
    pending: Option<MySqlRow>,
    columns: Vec<String>,
    exhausted: bool,
}

impl<'a> MySqlCursor<'a> {
    fn new(
        stream: BoxStream<'a, std::result::Result<MySqlRow, sqlx::Error>>,
        first: Option<MySqlRow>,
    ) -> Self {
        let columns = first
            .as_ref()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| col.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            stream,
            exhausted: first.is_none(),
            pending: first,
            columns,
        }
    }
}

#[async_trait]
impl<'a> RowCursor for MySqlCursor<'a> {
    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    async fn next_row(&mut self) -> Option<Result<Row>> {
        if let Some(row) = self.pending.take() {
            return Some(convert_row(&row));
        }
        if self.exhausted {
            return None;
        }

        match self.stream.try_next().await {
            Ok(Some(row)) => Some(convert_row(&row)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(SqlfanError::query(format!(
                    "rows iteration error: {}",
                    format_query_error(&e)
                ))))
            }
        }
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect::<std::result::Result<Row, sqlx::Error>>()
        .map_err(|e| SqlfanError::row_decode(format!("row scan error: {e}")))
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Numeric and boolean columns decode to typed values; everything else is
/// taken as the raw text-protocol bytes, which the executor turns into text.
fn convert_value(
    row: &MySqlRow,
    index: usize,
    type_name: &str,
) -> std::result::Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(index)?.map(Value::Int)
        }

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<Option<u64>, _>(index)?.map(Value::UInt),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| Value::Float(v as f64)),

        "DOUBLE" => row.try_get::<Option<f64>, _>(index)?.map(Value::Float),

        _ => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)?
            .map(Value::Bytes),
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Formats a statement error the way the mysql client prints it.
fn format_query_error(error: &sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    match db_error.try_downcast_ref::<MySqlDatabaseError>() {
        Some(mysql_error) => match mysql_error.code() {
            Some(state) => format!(
                "ERROR {} ({}): {}",
                mysql_error.number(),
                state,
                mysql_error.message()
            ),
            None => format!("ERROR {}: {}", mysql_error.number(), mysql_error.message()),
        },
        None => format!("ERROR: {}", db_error.message()),
    }
}
