//! Parser-local error type. Converts into [`ducksearch_core::DucksearchError`]
//! at the crate boundary, the way `zen-lake::LakeError` feeds into the
//! cross-cutting `zen-core::CoreError`.

use ducksearch_core::DucksearchError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("root layout invalid, missing: {0}")]
    PathMissing(String),

    #[error("unsupported metadata block: {0}")]
    UnsupportedBlock(String),

    #[error("metadata schema invalid: {0}")]
    SchemaInvalid(String),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("bad parameter type: {0}")]
    BadType(String),

    #[error("bad parameter scope: {0}")]
    BadScope(String),

    #[error("unknown reference: {0}")]
    UnknownRef(String),

    #[error("illegal parquet_scan path: {0}")]
    BadParquetPath(String),

    #[error("illegal SQL construct: {0}")]
    IllegalSql(String),

    #[error("report must contain exactly one SQL statement, found {0}")]
    MultipleStatements(usize),

    #[error("unsupported placeholder type: {0}")]
    BadPlaceholderType(String),

    #[error("dependency cycle detected: {0}")]
    Cycle(String),
}

impl From<ParserError> for DucksearchError {
    fn from(err: ParserError) -> Self {
        match err {
            ParserError::PathMissing(m) => Self::PathMissing(m),
            ParserError::UnsupportedBlock(m) => Self::UnsupportedBlock(m),
            ParserError::SchemaInvalid(m) => Self::SchemaInvalid(m),
            ParserError::DuplicateId(m) => Self::DuplicateId(m),
            ParserError::BadType(m) => Self::BadType(m),
            ParserError::BadScope(m) => Self::BadScope(m),
            ParserError::UnknownRef(m) => Self::UnknownRef(m),
            ParserError::BadParquetPath(m) => Self::BadParquetPath(m),
            ParserError::IllegalSql(m) => Self::IllegalSql(m),
            ParserError::MultipleStatements(n) => {
                Self::MultipleStatements(format!("expected exactly one statement, found {n}"))
            }
            ParserError::BadPlaceholderType(m) => Self::BadPlaceholderType(m),
            ParserError::Cycle(m) => Self::Cycle(m),
        }
    }
}
