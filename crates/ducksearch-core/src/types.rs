//! Shared data model (spec §3): `RootLayout`, `Report`, `Parameter`, and
//! friends. These are pure value types — no I/O, no SQL — built once at a
//! parse boundary and carried typed thereafter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The nine cache subdirectories a valid root must contain.
pub const CACHE_SUBDIRS: [&str; 9] = [
    "artifacts",
    "slices",
    "materialize",
    "literal_sources",
    "bindings",
    "facets",
    "charts",
    "manifests",
    "tmp",
];

/// A validated view of a ducksearch project root on disk (spec §3, C1).
///
/// Produced only by the root validator; every other component consumes it
/// read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootLayout {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub reports_dir: PathBuf,
    pub composites_dir: PathBuf,
    pub cache_dir: PathBuf,
    cache_subdirs: BTreeMap<&'static str, PathBuf>,
}

impl RootLayout {
    /// Build a layout rooted at `root`, without touching the filesystem.
    /// Validation of existence happens in `ducksearch-parser::root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        let cache_dir = root.join("cache");
        let cache_subdirs = CACHE_SUBDIRS
            .iter()
            .map(|name| (*name, cache_dir.join(name)))
            .collect();

        Self {
            config_file: root.join("config.toml"),
            reports_dir: root.join("reports"),
            composites_dir: root.join("composites"),
            cache_dir,
            cache_subdirs,
            root,
        }
    }

    /// Path to one of the nine required cache subdirectories. Panics if
    /// `name` is not one of [`CACHE_SUBDIRS`] — an internal-programmer-error
    /// guard, not a user-facing validation.
    #[must_use]
    pub fn cache_subdir(&self, name: &str) -> &Path {
        self.cache_subdirs
            .get(name)
            .unwrap_or_else(|| panic!("unknown cache subdir: {name}"))
    }

    #[must_use]
    pub fn artifacts_dir(&self) -> &Path {
        self.cache_subdir("artifacts")
    }

    #[must_use]
    pub fn materialize_dir(&self) -> &Path {
        self.cache_subdir("materialize")
    }

    #[must_use]
    pub fn literal_sources_dir(&self) -> &Path {
        self.cache_subdir("literal_sources")
    }

    #[must_use]
    pub fn bindings_dir(&self) -> &Path {
        self.cache_subdir("bindings")
    }

    /// All nine cache subdirectory paths, in declaration order.
    pub fn all_cache_subdirs(&self) -> impl Iterator<Item = &Path> {
        CACHE_SUBDIRS.iter().map(move |name| self.cache_subdir(name))
    }
}

/// Primitive scalar parameter types (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    Float,
    Bool,
    Date,
    DateTime,
    Str,
    InjectedStr,
}

impl PrimitiveType {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Str => "str",
            Self::InjectedStr => "InjectedStr",
        }
    }
}

/// A literal scalar value drawn from a `Literal[...]` / `InjectedIdentLiteral[...]`
/// type spec, or from a bound/parameter value at substitution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// Tagged variant for a parameter's declared type (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterType {
    Primitive(PrimitiveType),
    Optional(Box<ParameterType>),
    List(Box<ParameterType>),
    Literal(Vec<LiteralValue>),
    InjectedIdentLiteral(Vec<LiteralValue>),
}

impl ParameterType {
    /// Unwrap one layer of `Optional`, if present.
    #[must_use]
    pub fn inner_if_optional(&self) -> Option<&ParameterType> {
        match self {
            Self::Optional(inner) => Some(inner),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_injected_ident_literal(&self) -> bool {
        matches!(self, Self::InjectedIdentLiteral(_))
    }
}

/// Routing decision for a parameter (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterScope {
    Data,
    View,
    Hybrid,
}

impl ParameterScope {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::View => "view",
            Self::Hybrid => "hybrid",
        }
    }

    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "data" => Some(Self::Data),
            "view" => Some(Self::View),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

/// Mode for rewriting a parameter's target CTE (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliesToMode {
    Wrapper,
    Inline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliesTo {
    pub cte: String,
    pub mode: AppliesToMode,
}

/// A single parsed `PARAMS` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParameterType,
    pub scope: ParameterScope,
    pub applies_to: Option<AppliesTo>,
}

/// The seven placeholder kinds (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Config,
    Param,
    Bind,
    Mat,
    Import,
    Ident,
    Path,
}

impl PlaceholderKind {
    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "config" => Some(Self::Config),
            "param" => Some(Self::Param),
            "bind" => Some(Self::Bind),
            "mat" => Some(Self::Mat),
            "import" => Some(Self::Import),
            "ident" => Some(Self::Ident),
            "path" => Some(Self::Path),
            _ => None,
        }
    }
}

/// A single `{{type name}}` occurrence in the report's SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub name: String,
}

/// `CACHE.ttl_seconds` override for a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    pub ttl_seconds: Option<u64>,
}

/// A `LITERAL_SOURCES` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralSourceEntry {
    pub id: String,
    pub from_cte: String,
    pub value_column: String,
}

/// How a binding's resolved value is substituted into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    Single,
    List,
    PathListLiteral,
}

impl ValueMode {
    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "list" => Some(Self::List),
            "path_list_literal" => Some(Self::PathListLiteral),
            _ => None,
        }
    }
}

/// Either a declared parameter name or a literal sub-SELECT that supplies a
/// binding's lookup key.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingKey {
    Param(String),
    Sql(String),
}

/// A `BINDINGS` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingEntry {
    pub id: String,
    pub source: String,
    pub key_column: String,
    pub value_column: String,
    pub kind: String,
    pub key: BindingKey,
    pub value_mode: ValueMode,
}

/// An `IMPORTS` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportEntry {
    pub id: String,
    pub report: String,
    pub pass_params: Vec<String>,
}

/// Typed metadata extracted from a report's metadata blocks (spec §3).
///
/// `reserved` carries the blocks this core doesn't interpret further
/// (`SOURCES`, `TABLE`, `SEARCH`, `FACETS`, `CHARTS`, `DERIVED_PARAMS`,
/// `SECRETS`) — they are schema-validated (must be mappings) by the parser
/// but otherwise belong to collaborators outside this scope.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// `CONFIG` block: key → string type-hint (actual values come from
    /// `config.toml`, not from this block).
    pub config: BTreeMap<String, String>,
    pub cache: Option<CacheConfig>,
    pub literal_sources: Vec<LiteralSourceEntry>,
    pub bindings: Vec<BindingEntry>,
    pub imports: Vec<ImportEntry>,
    pub reserved: BTreeMap<String, serde_json::Value>,
}

/// Product of parsing a report file (spec §3).
#[derive(Debug, Clone)]
pub struct Report {
    /// Original SQL with metadata blocks stripped, single statement.
    pub sql: String,
    pub metadata: Metadata,
    pub parameters: Vec<Parameter>,
}

impl Report {
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// The four output-path bundles produced by executing a report (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub base: PathBuf,
    pub materialized: BTreeMap<String, PathBuf>,
    pub literal_sources: BTreeMap<String, PathBuf>,
    pub bindings: BTreeMap<String, PathBuf>,
}
