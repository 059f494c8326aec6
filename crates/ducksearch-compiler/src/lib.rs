//! # ducksearch-compiler
//!
//! C3: rewrites `MATERIALIZE[_CLOSED]` CTEs out of a report's SQL and
//! substitutes every `{{kind name}}` placeholder with its resolved SQL
//! rendering. Pure text in, text out — no filesystem access, no DuckDB
//! connection. The execution pipeline (`ducksearch-exec`) supplies the
//! resolved [`PlaceholderContext`] and runs the resulting SQL.

pub mod error;
pub mod materialize;
pub mod render;
pub mod substitute;

pub use error::CompilerError;
pub use materialize::rewrite_materializations;
pub use substitute::{substitute_placeholders, PlaceholderContext, ResolvedValue};
