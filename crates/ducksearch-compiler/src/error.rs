//! Compiler-local error type, converting into [`ducksearch_core::DucksearchError`]
//! at the crate boundary the same way [`ducksearch_parser::ParserError`] does.

use ducksearch_core::DucksearchError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompilerError {
    /// A `{{kind name}}` placeholder has no entry in the resolved context
    /// passed to [`crate::substitute::substitute_placeholders`]. Should be
    /// unreachable once [`ducksearch_parser::lint::validate_cross_references`]
    /// has run, but the compiler checks again rather than trusting callers.
    #[error("unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),

    #[error("malformed MATERIALIZE block: {0}")]
    MalformedMaterialize(String),
}

impl From<CompilerError> for DucksearchError {
    fn from(err: CompilerError) -> Self {
        match err {
            CompilerError::UnresolvedPlaceholder(m) => Self::UnknownRef(m),
            CompilerError::MalformedMaterialize(m) => Self::IllegalSql(m),
        }
    }
}
