//! # ducksearch-exec
//!
//! C4 (execution pipeline) and C5 (cache coordinator). Owns the one thing
//! the parser and compiler crates deliberately don't: a DuckDB
//! [`duckdb::Connection`] and the filesystem. [`pipeline::execute_report`]
//! is the single entry point the CLI's `serve` command and library
//! callers use.

pub mod cache;
pub mod error;
pub mod payload;
pub mod pipeline;

pub use error::ExecError;
pub use pipeline::execute_report;
