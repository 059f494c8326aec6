//! # ducksearch-core
//!
//! Shared types, error taxonomy, and response envelope for ducksearch: a
//! parameterized analytical report engine built atop an embedded DuckDB
//! execution engine.
//!
//! This crate has no I/O and no SQL — it is the vocabulary the parser,
//! compiler, and execution pipeline crates share.

pub mod envelope;
pub mod error;
pub mod types;

pub use envelope::{Envelope, ErrorPayload};
pub use error::DucksearchError;
pub use types::{
    AppliesTo, AppliesToMode, BindingEntry, BindingKey, CacheConfig, ExecutionResult,
    ImportEntry, LiteralSourceEntry, LiteralValue, Metadata, Parameter, ParameterScope,
    ParameterType, Placeholder, PlaceholderKind, PrimitiveType, Report, RootLayout, ValueMode,
    CACHE_SUBDIRS,
};
