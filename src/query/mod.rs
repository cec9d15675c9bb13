//! Statement segmentation and fan-out execution for sqlfan.
//!
//! The splitter turns raw SQL into statements, the executor runs them on one
//! endpoint, and the coordinator runs the executor across all endpoints.

pub mod coordinator;
pub mod executor;
pub mod outcome;
pub mod splitter;

pub use coordinator::{Coordinator, RunSession};
pub use executor::InstanceExecutor;
pub use outcome::{EndpointReport, ExecutionOutcome};
pub use splitter::{split_statements, StatementUnit};
