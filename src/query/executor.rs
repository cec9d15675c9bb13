//! Per-endpoint statement execution.
//!
//! Runs the statement list against one endpoint over a single connection and
//! turns everything that happens into `ExecutionOutcome`s. Nothing here fails:
//! errors are recorded on the outcome they belong to.

use std::time::Instant;

use tracing::{debug, warn};

use crate::config::Verbosity;
use crate::db::{Connector, DatabaseClient};
use crate::dsn::Endpoint;

use super::outcome::ExecutionOutcome;
use super::splitter::StatementUnit;

/// Executes statements on one endpoint.
pub struct InstanceExecutor<'a> {
    connector: &'a dyn Connector,
    verbosity: Verbosity,
}

impl<'a> InstanceExecutor<'a> {
    /// Creates a new executor.
    pub fn new(connector: &'a dyn Connector, verbosity: Verbosity) -> Self {
        Self {
            connector,
            verbosity,
        }
    }

    /// Runs every statement on `endpoint`, in order.
    ///
    /// Returns one outcome per statement, or a single endpoint-level outcome
    /// if the endpoint could not be connected to.
    pub async fn run(
        &self,
        endpoint: &Endpoint,
        statements: &[StatementUnit],
    ) -> Vec<ExecutionOutcome> {
        let mut client = match self.connector.connect(endpoint).await {
            Ok(client) => client,
            Err(e) => return vec![ExecutionOutcome::endpoint_failure(endpoint, e)],
        };

        if let Err(e) = client.ping().await {
            close_client(endpoint, client).await;
            return vec![ExecutionOutcome::endpoint_failure(endpoint, e)];
        }

        let mut outcomes = Vec::with_capacity(statements.len());
        for statement in statements {
            outcomes.push(self.run_statement(client.as_mut(), endpoint, statement).await);
        }

        close_client(endpoint, client).await;
        outcomes
    }

    async fn run_statement(
        &self,
        client: &mut dyn DatabaseClient,
        endpoint: &Endpoint,
        statement: &StatementUnit,
    ) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::for_statement(endpoint, statement);

        let collect_rows = {
            let start = Instant::now();
            let cursor = client.query(&statement.text).await;
            if self.verbosity.captures_timing() {
                outcome.duration = Some(start.elapsed());
            }

            let mut cursor = match cursor {
                Ok(cursor) => cursor,
                Err(e) => {
                    debug!(endpoint = %endpoint.masked(), statement = %statement.text, error = %e, "statement failed");
                    outcome.record_error(e);
                    return outcome;
                }
            };

            let collect_rows = match cursor.columns() {
                Ok(columns) => {
                    outcome.columns = columns;
                    true
                }
                Err(e) => {
                    outcome.record_error(e);
                    false
                }
            };

            while let Some(row) = cursor.next_row().await {
                if !collect_rows {
                    continue;
                }
                match row {
                    Ok(row) => outcome
                        .rows
                        .push(row.into_iter().map(|value| value.normalize()).collect()),
                    Err(e) => {
                        warn!(endpoint = %endpoint.masked(), statement = %statement.text, "skipping row: {e}");
                        outcome.record_error(e);
                    }
                }
            }
            drop(cursor);
            collect_rows
        };

        if collect_rows && outcome.columns.is_empty() && outcome.rows.is_empty() {
            match client.describe_columns(&statement.text).await {
                Ok(columns) => outcome.columns = columns,
                Err(e) => debug!(endpoint = %endpoint.masked(), statement = %statement.text, "no column metadata: {e}"),
            }
        }

        if self.verbosity.captures_row_count() {
            outcome.row_count = Some(outcome.rows.len());
        }

        outcome
    }
}

async fn close_client(endpoint: &Endpoint, client: Box<dyn DatabaseClient>) {
    if let Err(e) = client.close().await {
        debug!(endpoint = %endpoint.masked(), "error closing connection: {e}");
    }
}
