//! The stable ducksearch error taxonomy.
//!
//! Every failure surfaced to a caller (CLI exit code, HTTP envelope) is one
//! of these variants. Crate-local error types (`ParserError`, `CompilerError`,
//! `ExecError`, …) convert into `DucksearchError` at their crate boundary so
//! that `code()` stays a single source of truth.

use thiserror::Error;

/// Stable error taxonomy shared across the parser, compiler, and execution
/// pipeline. Variant names double as the `code` field of the HTTP/CLI error
/// envelope (see [`crate::envelope`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DucksearchError {
    /// Root layout validation failed; `message` lists every missing path.
    #[error("{0}")]
    PathMissing(String),

    /// A metadata block name outside the closed set of 13.
    #[error("{0}")]
    UnsupportedBlock(String),

    /// A metadata mapping violates its schema.
    #[error("{0}")]
    SchemaInvalid(String),

    /// Duplicate name/id within PARAMS, BINDINGS, or IMPORTS.
    #[error("{0}")]
    DuplicateId(String),

    /// Unsupported parameter type syntax.
    #[error("{0}")]
    BadType(String),

    /// Inferred or declared scope outside `{data, view, hybrid}`.
    #[error("{0}")]
    BadScope(String),

    /// A placeholder or binding key references an undeclared name.
    #[error("{0}")]
    UnknownRef(String),

    /// Illegal form in `parquet_scan(...)`.
    #[error("{0}")]
    BadParquetPath(String),

    /// A disallowed SQL keyword was found.
    #[error("{0}")]
    IllegalSql(String),

    /// More than one top-level SQL statement.
    #[error("{0}")]
    MultipleStatements(String),

    /// Placeholder type outside the allowed set.
    #[error("{0}")]
    BadPlaceholderType(String),

    /// Dependency cycle detected (metadata-level or import-level).
    #[error("{0}")]
    Cycle(String),

    /// Case-insensitive duplicate in the caller's payload.
    #[error("{0}")]
    DuplicateParamKey(String),

    /// The embedded engine raised; message is sanitized (no payload/secrets).
    #[error("{0}")]
    ExecutionFailed(String),
}

impl DucksearchError {
    /// The stable code string used in the `{code, message}` error envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PathMissing(_) => "PathMissing",
            Self::UnsupportedBlock(_) => "UnsupportedBlock",
            Self::SchemaInvalid(_) => "SchemaInvalid",
            Self::DuplicateId(_) => "DuplicateId",
            Self::BadType(_) => "BadType",
            Self::BadScope(_) => "BadScope",
            Self::UnknownRef(_) => "UnknownRef",
            Self::BadParquetPath(_) => "BadParquetPath",
            Self::IllegalSql(_) => "IllegalSql",
            Self::MultipleStatements(_) => "MultipleStatements",
            Self::BadPlaceholderType(_) => "BadPlaceholderType",
            Self::Cycle(_) => "Cycle",
            Self::DuplicateParamKey(_) => "DuplicateParamKey",
            Self::ExecutionFailed(_) => "ExecutionFailed",
        }
    }

    /// The message half of the envelope, with no payload/secret leakage.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}
