//! sqlfan - run SQL statements against many MySQL instances at once.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod db;
pub mod dsn;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
pub mod servers;
