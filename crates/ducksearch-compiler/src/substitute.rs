//! Placeholder substitution: the second half of C3. Takes a SQL string
//! (already past [`crate::materialize::rewrite_materializations`]) and a
//! fully-resolved [`PlaceholderContext`], and textually replaces every
//! `{{kind name}}` occurrence with its rendered SQL fragment (spec §4.3).
//!
//! Resolution of *what* a name maps to (running a query, reading the
//! payload, checking a cache file's mtime) is the execution pipeline's
//! job; this module only renders already-resolved values.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use ducksearch_core::LiteralValue;
use regex::Regex;

use crate::error::CompilerError;
use crate::render::{quote_path, quote_sql_string, render_ident, render_literal, render_literal_list};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_]+)\s+([^}]+?)\s*\}\}").expect("valid regex"))
}

/// A resolved value ready for rendering into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Scalar(LiteralValue),
    List(Vec<LiteralValue>),
    Ident(String),
    Path(PathBuf),
}

/// Everything [`substitute_placeholders`] needs to fully resolve a
/// report's placeholders. Built by the execution pipeline from
/// `config.toml`, the request payload, and cache-artifact paths.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderContext {
    pub config: BTreeMap<String, String>,
    pub params: BTreeMap<String, ResolvedValue>,
    pub binds: BTreeMap<String, ResolvedValue>,
    pub mats: BTreeMap<String, PathBuf>,
    pub imports: BTreeMap<String, PathBuf>,
}

/// Replace every `{{kind name}}` occurrence in `sql` with its rendered
/// value from `ctx`.
///
/// # Errors
///
/// Returns [`CompilerError::UnresolvedPlaceholder`] for any occurrence
/// `ctx` has no entry for, and for an `ident`/`path` placeholder whose
/// resolved value isn't the matching [`ResolvedValue`] variant.
pub fn substitute_placeholders(sql: &str, ctx: &PlaceholderContext) -> Result<String, CompilerError> {
    let mut output = String::with_capacity(sql.len());
    let mut cursor = 0usize;

    for captures in placeholder_re().captures_iter(sql) {
        let whole = captures.get(0).expect("group 0 always present");
        let kind = captures.get(1).expect("kind group").as_str();
        let name = captures.get(2).expect("name group").as_str().trim();

        output.push_str(&sql[cursor..whole.start()]);
        output.push_str(&render_placeholder(kind, name, ctx)?);
        cursor = whole.end();
    }
    output.push_str(&sql[cursor..]);

    Ok(output)
}

fn render_placeholder(kind: &str, name: &str, ctx: &PlaceholderContext) -> Result<String, CompilerError> {
    match kind.to_ascii_lowercase().as_str() {
        "config" => ctx
            .config
            .get(name)
            .map(|v| quote_sql_string(v))
            .ok_or_else(|| unresolved("config", name)),
        "param" => ctx.params.get(name).map(render_resolved).ok_or_else(|| unresolved("param", name)),
        "bind" => ctx.binds.get(name).map(render_resolved).ok_or_else(|| unresolved("bind", name)),
        "mat" => ctx
            .mats
            .get(name)
            .map(|path| quote_path(&path.display().to_string()))
            .ok_or_else(|| unresolved("mat", name)),
        "import" => ctx
            .imports
            .get(name)
            .map(|path| quote_path(&path.display().to_string()))
            .ok_or_else(|| unresolved("import", name)),
        "ident" => resolve_ident_or_path(ctx, name, true),
        "path" => resolve_ident_or_path(ctx, name, false),
        other => Err(CompilerError::UnresolvedPlaceholder(format!(
            "unknown placeholder kind {other} for {name}"
        ))),
    }
}

fn resolve_ident_or_path(ctx: &PlaceholderContext, name: &str, is_ident: bool) -> Result<String, CompilerError> {
    let resolved = ctx
        .params
        .get(name)
        .or_else(|| ctx.binds.get(name))
        .ok_or_else(|| unresolved(if is_ident { "ident" } else { "path" }, name))?;

    match (is_ident, resolved) {
        (true, ResolvedValue::Ident(s)) => Ok(render_ident(s)),
        (false, ResolvedValue::Path(p)) => Ok(quote_path(&p.display().to_string())),
        (false, ResolvedValue::Scalar(LiteralValue::Str(s))) => Ok(quote_path(s)),
        _ => Err(CompilerError::UnresolvedPlaceholder(format!(
            "{name} did not resolve to a value usable as {}",
            if is_ident { "ident" } else { "path" }
        ))),
    }
}

fn render_resolved(value: &ResolvedValue) -> String {
    match value {
        ResolvedValue::Scalar(v) => render_literal(v),
        ResolvedValue::List(values) => render_literal_list(values),
        ResolvedValue::Ident(s) => render_ident(s),
        ResolvedValue::Path(p) => quote_path(&p.display().to_string()),
    }
}

fn unresolved(kind: &str, name: &str) -> CompilerError {
    CompilerError::UnresolvedPlaceholder(format!("{{{{{kind} {name}}}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_scalar_param() {
        let mut ctx = PlaceholderContext::default();
        ctx.params.insert("widget_id".into(), ResolvedValue::Scalar(LiteralValue::Int(42)));
        let out = substitute_placeholders("SELECT {{param widget_id}}", &ctx).unwrap();
        assert_eq!(out, "SELECT 42");
    }

    #[test]
    fn substitutes_list_bind_as_parenthesized_list() {
        let mut ctx = PlaceholderContext::default();
        ctx.binds.insert(
            "region_ids".into(),
            ResolvedValue::List(vec![LiteralValue::Int(1), LiteralValue::Int(2)]),
        );
        let out = substitute_placeholders("WHERE id IN {{bind region_ids}}", &ctx).unwrap();
        assert_eq!(out, "WHERE id IN (1, 2)");
    }

    #[test]
    fn substitutes_mat_as_a_quoted_path_literal() {
        let mut ctx = PlaceholderContext::default();
        ctx.mats.insert("widgets".into(), PathBuf::from("cache/materialize/k__widgets.parquet"));
        let out = substitute_placeholders("FROM {{mat widgets}}", &ctx).unwrap();
        assert_eq!(out, "FROM 'cache/materialize/k__widgets.parquet'");
    }

    #[test]
    fn substitutes_import_as_a_quoted_path_literal() {
        let mut ctx = PlaceholderContext::default();
        ctx.imports.insert("x".into(), PathBuf::from("cache/artifacts/other.parquet"));
        let out = substitute_placeholders("FROM {{import x}}", &ctx).unwrap();
        assert_eq!(out, "FROM 'cache/artifacts/other.parquet'");
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let ctx = PlaceholderContext::default();
        let err = substitute_placeholders("SELECT {{param missing}}", &ctx).unwrap_err();
        assert!(matches!(err, CompilerError::UnresolvedPlaceholder(_)));
    }

    #[test]
    fn ident_placeholder_renders_bare() {
        let mut ctx = PlaceholderContext::default();
        ctx.params.insert("col".into(), ResolvedValue::Ident("region_name".into()));
        let out = substitute_placeholders("SELECT {{ident col}} FROM t", &ctx).unwrap();
        assert_eq!(out, "SELECT region_name FROM t");
    }
}
