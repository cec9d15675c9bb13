//! Integration tests for sqlfan.
//!
//! The MySQL tests require a running MySQL server.
//! Set DATABASE_URL environment variable to run them.

pub mod fanout_test;
pub mod mysql_test;
pub mod presenter_test;
