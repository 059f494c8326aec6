//! Execution-pipeline error type. Wraps the parser and compiler errors it
//! propagates plus the failure modes specific to running the report
//! (duplicate payload keys, import cycles, DuckDB/IO failures), and
//! converts into [`ducksearch_core::DucksearchError`] at the crate
//! boundary.

use ducksearch_core::DucksearchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Parser(#[from] ducksearch_parser::ParserError),

    #[error(transparent)]
    Compiler(#[from] ducksearch_compiler::CompilerError),

    #[error("duplicate parameter key (case-insensitive): {0}")]
    DuplicateParamKey(String),

    #[error("import cycle detected at: {0}")]
    ImportCycle(String),

    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<ExecError> for DucksearchError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Parser(e) => e.into(),
            ExecError::Compiler(e) => e.into(),
            ExecError::DuplicateParamKey(m) => Self::DuplicateParamKey(m),
            ExecError::ImportCycle(m) => Self::Cycle(m),
            // The embedded engine's own error text routinely echoes the
            // failing statement back verbatim — which, post-substitution,
            // can contain payload values or `{{config ...}}`-rendered
            // secrets. Spec §7 requires `ExecutionFailed` messages never
            // carry payload/secret content, so the underlying duckdb
            // message is dropped rather than interpolated; it's still
            // available to operators via `tracing::error!` at the call
            // site, just not in the user-facing envelope.
            ExecError::DuckDb(_) => {
                Self::ExecutionFailed("the embedded SQL engine rejected the query".to_string())
            }
            ExecError::Io { path, .. } => {
                Self::ExecutionFailed(format!("I/O error writing cache artifact at {path}"))
            }
            ExecError::ExecutionFailed(m) => Self::ExecutionFailed(m),
        }
    }
}
