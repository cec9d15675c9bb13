//! Fan-out across endpoints.
//!
//! Runs the same statements on every endpoint, either one endpoint after
//! another or all at once, and hands back each endpoint's outcomes in the
//! order the endpoints were given.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::config::Verbosity;
use crate::db::Connector;
use crate::dsn::Endpoint;
use crate::error::SqlfanError;

use super::executor::InstanceExecutor;
use super::outcome::{EndpointReport, ExecutionOutcome};
use super::splitter::StatementUnit;

/// One fan-out run: what to run, where, and how.
#[derive(Debug, Clone)]
pub struct RunSession {
    pub endpoints: Vec<Endpoint>,
    pub statements: Arc<[StatementUnit]>,
    pub concurrent: bool,
}

impl RunSession {
    pub fn new(
        endpoints: Vec<Endpoint>,
        statements: Vec<StatementUnit>,
        concurrent: bool,
    ) -> Self {
        Self {
            endpoints,
            statements: statements.into(),
            concurrent,
        }
    }
}

/// Dispatches a run to per-endpoint executors.
pub struct Coordinator {
    connector: Arc<dyn Connector>,
    verbosity: Verbosity,
}

impl Coordinator {
    /// Creates a new coordinator.
    pub fn new(connector: Arc<dyn Connector>, verbosity: Verbosity) -> Self {
        Self {
            connector,
            verbosity,
        }
    }

    /// Executes `session` and hands each endpoint's report to `emit`, in
    /// input order.
    ///
    /// Sequential runs emit each report as soon as its endpoint is done.
    /// Concurrent runs emit nothing until every endpoint has finished.
    pub async fn run<F>(&self, session: &RunSession, emit: F)
    where
        F: FnMut(EndpointReport),
    {
        if session.concurrent {
            self.run_concurrent(session, emit).await;
        } else {
            self.run_sequential(session, emit).await;
        }
    }

    /// Executes `session` and returns every report, in input order.
    pub async fn collect(&self, session: &RunSession) -> Vec<EndpointReport> {
        let mut reports = Vec::with_capacity(session.endpoints.len());
        self.run(session, |report| reports.push(report)).await;
        reports
    }

    async fn run_sequential<F>(&self, session: &RunSession, mut emit: F)
    where
        F: FnMut(EndpointReport),
    {
        let executor = InstanceExecutor::new(self.connector.as_ref(), self.verbosity);

        for (index, endpoint) in session.endpoints.iter().enumerate() {
            debug!(index, endpoint = %endpoint.masked(), "running endpoint");
            let outcomes = AssertUnwindSafe(executor.run(endpoint, &session.statements))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| vec![worker_panic(endpoint, panic)]);

            emit(EndpointReport {
                index,
                endpoint: endpoint.clone(),
                outcomes,
            });
        }
    }

    async fn run_concurrent<F>(&self, session: &RunSession, mut emit: F)
    where
        F: FnMut(EndpointReport),
    {
        let mut slots: Vec<Option<Vec<ExecutionOutcome>>> = vec![None; session.endpoints.len()];
        let mut tasks = JoinSet::new();

        for (index, endpoint) in session.endpoints.iter().enumerate() {
            let connector = Arc::clone(&self.connector);
            let statements = Arc::clone(&session.statements);
            let endpoint = endpoint.clone();
            let verbosity = self.verbosity;

            tasks.spawn(async move {
                let executor = InstanceExecutor::new(connector.as_ref(), verbosity);
                let outcomes = AssertUnwindSafe(executor.run(&endpoint, &statements))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| vec![worker_panic(&endpoint, panic)]);
                (index, outcomes)
            });
        }
        debug!(tasks = tasks.len(), "spawned endpoint workers");

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcomes)) => match slots.get_mut(index) {
                    Some(slot) if slot.is_none() => *slot = Some(outcomes),
                    _ => error!(index, "discarding duplicate or out-of-range endpoint result"),
                },
                Err(e) => error!("endpoint worker failed to join: {e}"),
            }
        }

        for (index, (endpoint, slot)) in session.endpoints.iter().zip(slots).enumerate() {
            let outcomes = slot.unwrap_or_else(|| {
                vec![ExecutionOutcome::endpoint_failure(
                    endpoint,
                    SqlfanError::worker("worker exited without reporting results"),
                )]
            });
            emit(EndpointReport {
                index,
                endpoint: endpoint.clone(),
                outcomes,
            });
        }
    }
}

/// Turns a caught panic into the endpoint's only outcome.
fn worker_panic(endpoint: &Endpoint, panic: Box<dyn Any + Send>) -> ExecutionOutcome {
    let message = panic_message(panic.as_ref());
    error!(endpoint = %endpoint.masked(), "worker panicked: {message}");
    ExecutionOutcome::endpoint_failure(
        endpoint,
        SqlfanError::worker(format!("unexpected failure: {message}")),
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
