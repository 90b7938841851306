//! Local SQLite database support
//!
//! The hosted backend owns the real schema; this module mirrors its tables
//! for the local store adapter and the test suites.

pub mod init;

pub use init::{create_schema, init_database, init_memory_database};
