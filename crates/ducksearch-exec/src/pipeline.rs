//! C4: the execution pipeline. Ties the parser, compiler, and cache
//! coordinator together: parse+lint, recurse into imports, materialize
//! CTEs and literal sources and bindings (each gated by TTL freshness),
//! compile the final placeholder substitution, and run it to the
//! report's own cached parquet artifact (spec §5).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ducksearch_compiler::{rewrite_materializations, substitute_placeholders, PlaceholderContext, ResolvedValue};
use ducksearch_core::{BindingKey, ExecutionResult, LiteralValue, ParameterType, PrimitiveType, RootLayout, ValueMode};
use duckdb::Connection;
use serde_json::Value;

use crate::cache;
use crate::error::ExecError;
use crate::payload;

/// Execute `report_relative_path` (a path relative to `layout.reports_dir`)
/// against `payload` and `config`, recursing into any `IMPORTS` it
/// declares, and return the cache-relative paths of everything produced.
///
/// `now` is the monotonic timestamp used to evaluate cache freshness; pass
/// `None` to use the real wall clock. Tests pass a fixed `now` to exercise
/// TTL transitions deterministically.
///
/// # Errors
///
/// Returns the first [`ExecError`] encountered: a parser/linter failure,
/// a duplicate payload key, an import cycle, or a DuckDB/IO failure.
pub fn execute_report(
    layout: &RootLayout,
    conn: &Connection,
    report_relative_path: &Path,
    payload: &BTreeMap<String, Value>,
    config: &BTreeMap<String, String>,
    now: Option<SystemTime>,
) -> Result<ExecutionResult, ExecError> {
    let mut visiting = BTreeSet::new();
    execute_report_inner(layout, conn, report_relative_path, payload, config, now, &mut visiting)
}

fn execute_report_inner(
    layout: &RootLayout,
    conn: &Connection,
    report_relative_path: &Path,
    raw_payload: &BTreeMap<String, Value>,
    config: &BTreeMap<String, String>,
    now: Option<SystemTime>,
    visiting: &mut BTreeSet<PathBuf>,
) -> Result<ExecutionResult, ExecError> {
    let report_path = layout.reports_dir.join(report_relative_path);
    if !visiting.insert(report_path.clone()) {
        return Err(ExecError::ImportCycle(report_relative_path.display().to_string()));
    }

    let source = std::fs::read_to_string(&report_path)
        .map_err(|source| ExecError::Io { path: report_path.display().to_string(), source })?;
    let report = ducksearch_parser::lint_report(&source)?;

    let payload = payload::fold_payload(raw_payload)?;
    let key = cache::cache_key_for(&layout.reports_dir, &report_path)?;
    let ttl = report
        .metadata
        .cache
        .and_then(|c| c.ttl_seconds)
        .unwrap_or(cache::DEFAULT_TTL_SECONDS);

    let mut resolved_params = BTreeMap::new();
    for parameter in &report.parameters {
        if let Some(value) = payload::resolve_param_value(&payload, parameter) {
            resolved_params.insert(parameter.name.clone(), json_to_resolved(value, &parameter.param_type));
        } else if parameter.param_type_is_optional() {
            resolved_params.insert(parameter.name.clone(), ResolvedValue::Scalar(LiteralValue::Null));
        }
    }

    let mut import_paths = BTreeMap::new();
    for import in &report.metadata.imports {
        let mut sub_payload = BTreeMap::new();
        for name in &import.pass_params {
            if let Some(value) = payload.get(name) {
                sub_payload.insert(name.clone(), value.clone());
            }
        }
        let sub_result = execute_report_inner(
            layout,
            conn,
            Path::new(&import.report),
            &sub_payload,
            config,
            now,
            visiting,
        )?;
        import_paths.insert(import.id.clone(), sub_result.base);
    }
    visiting.remove(&report_path);

    let (rewritten_sql, materialize_bodies) = rewrite_materializations(&report.sql)?;
    let prefix = with_clause_prefix(&rewritten_sql).unwrap_or("").to_string();

    let mut mat_paths = BTreeMap::new();
    for (name, body) in &materialize_bodies {
        let path = cache::materialize_path(layout, &key, name);
        if !cache::is_fresh(&path, ttl, now) {
            run_query_to_parquet(conn, layout.cache_subdir("tmp"), body, &path)?;
        }
        mat_paths.insert(name.clone(), path);
    }

    let mut literal_paths = BTreeMap::new();
    for entry in &report.metadata.literal_sources {
        let path = cache::literal_source_path(layout, &key, &entry.id);
        if !cache::is_fresh(&path, ttl, now) {
            let query = format!(
                "{prefix} SELECT DISTINCT {col} AS value FROM {cte}",
                col = entry.value_column,
                cte = entry.from_cte
            );
            run_query_to_parquet(conn, layout.cache_subdir("tmp"), &query, &path)?;
        }
        literal_paths.insert(entry.id.clone(), path);
    }

    let mut binding_paths = BTreeMap::new();
    let mut resolved_binds = BTreeMap::new();
    for entry in &report.metadata.bindings {
        let path = cache::bindings_path(layout, &key, &entry.id);
        if !cache::is_fresh(&path, ttl, now) {
            let query = format!(
                "{prefix} SELECT {key_col} AS key, {value_col} AS value FROM {source}",
                key_col = entry.key_column,
                value_col = entry.value_column,
                source = entry.source
            );
            run_query_to_parquet(conn, layout.cache_subdir("tmp"), &query, &path)?;
        }
        binding_paths.insert(entry.id.clone(), path.clone());

        if let BindingKey::Param(param_name) = &entry.key {
            if let Some(key_value) = resolved_params.get(param_name) {
                let resolved = resolve_binding_value(conn, entry.value_mode, &path, key_value)?;
                resolved_binds.insert(entry.id.clone(), resolved);
            }
        }
    }

    let ctx = PlaceholderContext {
        config: config.clone(),
        params: resolved_params,
        binds: resolved_binds,
        mats: mat_paths.clone(),
        imports: import_paths.clone(),
    };

    let final_sql = substitute_placeholders(&rewritten_sql, &ctx)?;
    let artifact_path = cache::artifact_path(layout, &key);
    if !cache::is_fresh(&artifact_path, ttl, now) {
        run_query_to_parquet(conn, layout.cache_subdir("tmp"), &final_sql, &artifact_path)?;
    }

    Ok(ExecutionResult {
        base: artifact_path,
        materialized: mat_paths,
        literal_sources: literal_paths,
        bindings: binding_paths,
    })
}

fn resolve_binding_value(
    conn: &Connection,
    value_mode: ValueMode,
    cache_path: &Path,
    key_value: &ResolvedValue,
) -> Result<ResolvedValue, ExecError> {
    let key_literal = match key_value {
        ResolvedValue::Scalar(v) => ducksearch_compiler::render::render_literal(v),
        ResolvedValue::List(values) => ducksearch_compiler::render::render_literal_list(values),
        ResolvedValue::Ident(s) => s.clone(),
        ResolvedValue::Path(p) => ducksearch_compiler::render::quote_path(&p.display().to_string()),
    };

    match value_mode {
        ValueMode::Single => {
            let sql = format!(
                "SELECT value FROM read_parquet('{}') WHERE key = {key_literal} LIMIT 1",
                cache_path.display()
            );
            let value: Option<String> = conn
                .query_row(&sql, [], |row| row.get(0))
                .ok();
            Ok(ResolvedValue::Scalar(value.map_or(LiteralValue::Null, LiteralValue::Str)))
        }
        ValueMode::List | ValueMode::PathListLiteral => {
            let sql = format!(
                "SELECT value FROM read_parquet('{}') WHERE key = {key_literal}",
                cache_path.display()
            );
            let mut statement = conn.prepare(&sql)?;
            let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
            let values = rows
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(LiteralValue::Str)
                .collect();
            Ok(ResolvedValue::List(values))
        }
    }
}

fn run_query_to_parquet(
    conn: &Connection,
    tmp_dir: &Path,
    sql: &str,
    final_path: &Path,
) -> Result<(), ExecError> {
    if let Some(parent) = final_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|source| ExecError::Io { path: parent.display().to_string(), source })?;
    }
    let tmp_name = format!(
        "{}.{}.tmp",
        final_path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact"),
        std::process::id()
    );
    let tmp_path = tmp_dir.join(tmp_name);

    let statement = format!("COPY ({sql}) TO '{}' (FORMAT PARQUET)", tmp_path.display());
    conn.execute_batch(&statement).map_err(|source| {
        tracing::error!(path = %final_path.display(), error = %source, "embedded engine rejected query");
        ExecError::DuckDb(source)
    })?;

    std::fs::rename(&tmp_path, final_path)
        .map_err(|source| ExecError::Io { path: final_path.display().to_string(), source })?;
    tracing::debug!(path = %final_path.display(), "wrote cache artifact");
    Ok(())
}

/// The `WITH <ctes...>` prefix of `sql`, stopping just before the
/// top-level `SELECT` that follows it. `None` if `sql` has no CTEs.
fn with_clause_prefix(sql: &str) -> Option<&str> {
    if !sql.trim_start().to_ascii_uppercase().starts_with("WITH") {
        return None;
    }
    let upper = sql.to_ascii_uppercase();
    let bytes = sql.as_bytes();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;

    let mut i = 0usize;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        if let Some(quote) = in_string {
            if ch == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }
        match ch {
            '\'' | '"' => in_string = Some(ch),
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth == 0 && i > 0 && upper[i..].starts_with("SELECT") {
            return Some(sql[..i].trim_end());
        }
        i += 1;
    }
    None
}

/// Unwrap `Optional`/`List` layers to find the primitive a scalar JSON
/// value should be interpreted against — `date`/`datetime` params arrive
/// over the wire as plain JSON strings, and only this primitive hint lets
/// us tell a date string from an ordinary one.
fn effective_primitive(param_type: &ParameterType) -> Option<PrimitiveType> {
    match param_type {
        ParameterType::Primitive(p) => Some(*p),
        ParameterType::Optional(inner) | ParameterType::List(inner) => effective_primitive(inner),
        ParameterType::Literal(_) | ParameterType::InjectedIdentLiteral(_) => None,
    }
}

fn string_to_literal(s: &str, primitive: Option<PrimitiveType>) -> LiteralValue {
    match primitive {
        Some(PrimitiveType::Date) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_or_else(|_| LiteralValue::Str(s.to_string()), LiteralValue::Date),
        Some(PrimitiveType::DateTime) => parse_datetime(s)
            .map_or_else(|| LiteralValue::Str(s.to_string()), LiteralValue::DateTime),
        _ => LiteralValue::Str(s.to_string()),
    }
}

fn parse_datetime(s: &str) -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

fn json_to_resolved(value: &Value, param_type: &ParameterType) -> ResolvedValue {
    if param_type.is_injected_ident_literal()
        || matches!(param_type, ParameterType::Primitive(PrimitiveType::InjectedStr))
    {
        if let Value::String(s) = value {
            return ResolvedValue::Ident(s.clone());
        }
    }

    let primitive = effective_primitive(param_type);

    match value {
        Value::String(s) => ResolvedValue::Scalar(string_to_literal(s, primitive)),
        Value::Bool(b) => ResolvedValue::Scalar(LiteralValue::Bool(*b)),
        Value::Number(n) => n.as_i64().map_or_else(
            || ResolvedValue::Scalar(LiteralValue::Float(n.as_f64().unwrap_or_default())),
            |i| ResolvedValue::Scalar(LiteralValue::Int(i)),
        ),
        Value::Array(items) => {
            ResolvedValue::List(items.iter().map(|item| json_to_literal(item, primitive)).collect())
        }
        Value::Null | Value::Object(_) => ResolvedValue::Scalar(LiteralValue::Null),
    }
}

fn json_to_literal(value: &Value, primitive: Option<PrimitiveType>) -> LiteralValue {
    match value {
        Value::String(s) => string_to_literal(s, primitive),
        Value::Bool(b) => LiteralValue::Bool(*b),
        Value::Number(n) => n.as_i64().map_or_else(
            || LiteralValue::Float(n.as_f64().unwrap_or_default()),
            LiteralValue::Int,
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => LiteralValue::Null,
    }
}

trait OptionalParam {
    fn param_type_is_optional(&self) -> bool;
}

impl OptionalParam for ducksearch_core::Parameter {
    fn param_type_is_optional(&self) -> bool {
        matches!(self.param_type, ParameterType::Optional(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_clause_prefix_extracts_up_to_top_level_select() {
        let sql = "WITH a AS (SELECT 1) SELECT * FROM a";
        assert_eq!(with_clause_prefix(sql), Some("WITH a AS (SELECT 1)"));
    }

    #[test]
    fn with_clause_prefix_is_none_without_with() {
        assert_eq!(with_clause_prefix("SELECT 1"), None);
    }

    #[test]
    fn json_to_resolved_treats_injected_str_as_ident() {
        let value = Value::String("region_name".to_string());
        let resolved = json_to_resolved(&value, &ParameterType::Primitive(PrimitiveType::InjectedStr));
        assert_eq!(resolved, ResolvedValue::Ident("region_name".to_string()));
    }

    #[test]
    fn json_to_resolved_converts_array_to_list() {
        let value = Value::Array(vec![Value::from(1), Value::from(2)]);
        let resolved = json_to_resolved(&value, &ParameterType::List(Box::new(ParameterType::Primitive(PrimitiveType::Int))));
        assert_eq!(
            resolved,
            ResolvedValue::List(vec![LiteralValue::Int(1), LiteralValue::Int(2)])
        );
    }

    #[test]
    fn json_to_resolved_parses_date_strings_against_a_date_param() {
        let value = Value::String("2024-03-14".to_string());
        let resolved = json_to_resolved(&value, &ParameterType::Primitive(PrimitiveType::Date));
        assert_eq!(
            resolved,
            ResolvedValue::Scalar(LiteralValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()))
        );
    }

    #[test]
    fn json_to_resolved_falls_back_to_str_for_unparseable_date() {
        let value = Value::String("not-a-date".to_string());
        let resolved = json_to_resolved(&value, &ParameterType::Primitive(PrimitiveType::Date));
        assert_eq!(resolved, ResolvedValue::Scalar(LiteralValue::Str("not-a-date".to_string())));
    }

    #[test]
    fn json_to_resolved_parses_datetime_list_elements() {
        let value = Value::Array(vec![Value::String("2024-03-14T09:30:00".to_string())]);
        let resolved = json_to_resolved(
            &value,
            &ParameterType::List(Box::new(ParameterType::Primitive(PrimitiveType::DateTime))),
        );
        let expected_dt = chrono::NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(resolved, ResolvedValue::List(vec![LiteralValue::DateTime(expected_dt)]));
    }
}
