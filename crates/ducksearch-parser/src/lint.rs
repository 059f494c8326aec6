//! C2 (part two): `PARAMS` grammar, cross-reference validation, dependency
//! cycle detection, and the SQL-construct / `parquet_scan` discipline
//! checks (spec §4.2, §8).
//!
//! Each check here takes an already-assembled [`Report`] (or, for the
//! grammar parser, a raw `PARAMS` block body) and returns a [`ParserError`]
//! naming the first violation found — these are deliberately fail-fast,
//! unlike root validation which collects every miss at once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use ducksearch_core::{
    AppliesTo, AppliesToMode, LiteralValue, Parameter, ParameterScope, ParameterType,
    PlaceholderKind, PrimitiveType, Report,
};
use regex::Regex;

use crate::error::ParserError;

fn param_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.+?)\s*(?:\(([^)]*)\))?\s*$")
            .expect("valid regex")
    })
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_]+)\s+([^}]+?)\s*\}\}").expect("valid regex")
    })
}

fn cte_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([A-Za-z_][A-Za-z0-9_]*)\s+AS\s*(MATERIALIZE(?:_CLOSED)?)?\s*\(")
            .expect("valid regex")
    })
}

/// Parse a `PARAMS` block body into declared [`Parameter`]s.
///
/// Each line has the shape `name: type (scope=..., applies_to=cte:mode)`;
/// the parenthesized attribute clause is optional. Parameter names are
/// compared case-insensitively; a collision is a [`ParserError::DuplicateId`].
///
/// When a declaration omits `scope`, it is inferred from `report_sql`
/// (spec §4.2): `data` if the body references `{{param <name>}}` or
/// `{{ident <name>}}` (placeholder keyword matched case-insensitively,
/// name matched exactly), otherwise `view`.
///
/// # Errors
///
/// Returns [`ParserError::SchemaInvalid`] for a malformed line,
/// [`ParserError::BadType`] for an unparseable type expression,
/// [`ParserError::BadScope`] for an unknown `scope=` value, and
/// [`ParserError::DuplicateId`] for a repeated name.
pub fn parse_params(body: &str, report_sql: &str) -> Result<Vec<Parameter>, ParserError> {
    let mut parameters = Vec::new();
    let mut seen = BTreeSet::new();

    for raw_line in body.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let captures = param_line_re().captures(line).ok_or_else(|| {
            ParserError::SchemaInvalid(format!("malformed PARAMS entry: {line}"))
        })?;
        let name = captures.get(1).expect("name group").as_str().to_string();
        let type_text = captures.get(2).expect("type group").as_str();
        let attrs_text = captures.get(3).map_or("", |m| m.as_str());

        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(ParserError::DuplicateId(name));
        }

        let param_type = parse_type(type_text)?;
        let attrs = parse_attrs(attrs_text)?;

        let scope = match attrs.get("scope") {
            Some(scope_keyword) => ParameterScope::from_keyword(scope_keyword)
                .ok_or_else(|| ParserError::BadScope(format!("{name}: {scope_keyword}")))?,
            None => infer_scope(report_sql, &name),
        };

        let applies_to = match attrs.get("applies_to") {
            Some(raw) => Some(parse_applies_to(&name, raw)?),
            None => None,
        };

        parameters.push(Parameter { name, param_type, scope, applies_to });
    }

    Ok(parameters)
}

/// Default scope for a `PARAMS` entry that declares no `scope=` attribute
/// (spec §4.2): `data` if `sql` references the parameter through
/// `{{param <name>}}` or `{{ident <name>}}`, else `view`.
fn infer_scope(sql: &str, name: &str) -> ParameterScope {
    let references_name = scan_placeholders(sql)
        .unwrap_or_default()
        .into_iter()
        .any(|(kind, placeholder_name)| {
            matches!(kind, PlaceholderKind::Param | PlaceholderKind::Ident) && placeholder_name == name
        });
    if references_name {
        ParameterScope::Data
    } else {
        ParameterScope::View
    }
}

fn parse_attrs(text: &str) -> Result<BTreeMap<String, String>, ParserError> {
    let mut attrs = BTreeMap::new();
    for piece in text.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let (key, value) = piece.split_once('=').ok_or_else(|| {
            ParserError::SchemaInvalid(format!("malformed PARAMS attribute: {piece}"))
        })?;
        attrs.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(attrs)
}

fn parse_applies_to(param_name: &str, raw: &str) -> Result<AppliesTo, ParserError> {
    let (cte, mode) = raw.split_once(':').ok_or_else(|| {
        ParserError::SchemaInvalid(format!(
            "PARAMS.{param_name}.applies_to must be `<cte>:<mode>`, found: {raw}"
        ))
    })?;
    let mode = match mode {
        "wrapper" => AppliesToMode::Wrapper,
        "inline" => AppliesToMode::Inline,
        other => {
            return Err(ParserError::SchemaInvalid(format!(
                "PARAMS.{param_name}.applies_to has unknown mode: {other}"
            )));
        }
    };
    Ok(AppliesTo { cte: cte.trim().to_string(), mode })
}

/// Recursive-descent parser for the type grammar: seven primitives plus
/// `Optional[_]`, `List[_]`, `Literal[...]`, and `InjectedIdentLiteral[...]`.
pub fn parse_type(raw: &str) -> Result<ParameterType, ParserError> {
    let raw = raw.trim();
    let Some(open) = raw.find('[') else {
        return parse_primitive(raw).map(ParameterType::Primitive);
    };

    let head = raw[..open].trim();
    let chars: Vec<char> = raw.chars().collect();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let mut close_idx = None;

    for (i, &ch) in chars.iter().enumerate().skip(open) {
        if let Some(quote) = in_string {
            if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => in_string = Some(ch),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    close_idx = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }

    let close_idx = close_idx
        .ok_or_else(|| ParserError::BadType(format!("unbalanced brackets in type: {raw}")))?;
    let inner: String = chars[open + 1..close_idx].iter().collect();
    let trailing: String = chars[close_idx + 1..].iter().collect();
    if !trailing.trim().is_empty() {
        return Err(ParserError::BadType(format!(
            "unexpected trailing content after type: {raw}"
        )));
    }

    match head {
        "Optional" => Ok(ParameterType::Optional(Box::new(parse_type(&inner)?))),
        "List" => Ok(ParameterType::List(Box::new(parse_type(&inner)?))),
        "Literal" => Ok(ParameterType::Literal(parse_literal_list(&inner)?)),
        "InjectedIdentLiteral" => {
            Ok(ParameterType::InjectedIdentLiteral(parse_literal_list(&inner)?))
        }
        other => Err(ParserError::BadType(format!("unknown generic type: {other}"))),
    }
}

fn parse_primitive(raw: &str) -> Result<PrimitiveType, ParserError> {
    match raw {
        "int" => Ok(PrimitiveType::Int),
        "float" => Ok(PrimitiveType::Float),
        "bool" => Ok(PrimitiveType::Bool),
        "date" => Ok(PrimitiveType::Date),
        "datetime" => Ok(PrimitiveType::DateTime),
        "str" => Ok(PrimitiveType::Str),
        "InjectedStr" => Ok(PrimitiveType::InjectedStr),
        other => Err(ParserError::BadType(format!("unknown primitive type: {other}"))),
    }
}

fn parse_literal_list(inner: &str) -> Result<Vec<LiteralValue>, ParserError> {
    split_top_level_commas(inner)
        .into_iter()
        .map(|item| parse_literal(item.trim()))
        .collect()
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut in_string: Option<char> = None;
    let mut start = 0usize;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for &(idx, ch) in &chars {
        if let Some(quote) = in_string {
            if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => in_string = Some(ch),
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                items.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    let tail = &text[start..];
    if !tail.trim().is_empty() || !items.is_empty() {
        items.push(tail);
    }
    items
}

fn parse_literal(token: &str) -> Result<LiteralValue, ParserError> {
    if token.len() >= 2
        && ((token.starts_with('\'') && token.ends_with('\''))
            || (token.starts_with('"') && token.ends_with('"')))
    {
        return Ok(LiteralValue::Str(token[1..token.len() - 1].to_string()));
    }
    match token {
        "true" => return Ok(LiteralValue::Bool(true)),
        "false" => return Ok(LiteralValue::Bool(false)),
        "null" | "None" => return Ok(LiteralValue::Null),
        _ => {}
    }
    if let Ok(i) = token.parse::<i64>() {
        return Ok(LiteralValue::Int(i));
    }
    if let Ok(f) = token.parse::<f64>() {
        return Ok(LiteralValue::Float(f));
    }
    Err(ParserError::BadType(format!("unparseable literal value: {token}")))
}

/// Every top-level CTE name declared in `sql`, distinguishing plain CTEs
/// from `MATERIALIZE[_CLOSED]` ones.
#[must_use]
pub fn cte_names(sql: &str) -> BTreeMap<String, bool> {
    let mut names = BTreeMap::new();
    for captures in cte_def_re().captures_iter(sql) {
        let name = captures.get(1).expect("cte name group").as_str().to_string();
        let is_materialized = captures.get(2).is_some();
        names.entry(name).or_insert(is_materialized);
    }
    names
}

/// Every `{{kind name}}` placeholder occurrence in `sql`.
///
/// # Errors
///
/// Returns [`ParserError::BadPlaceholderType`] for an occurrence whose
/// `kind` doesn't match one of the seven recognized keywords.
pub fn scan_placeholders(sql: &str) -> Result<Vec<(PlaceholderKind, String)>, ParserError> {
    let mut found = Vec::new();
    for captures in placeholder_re().captures_iter(sql) {
        let kind_text = captures.get(1).expect("kind group").as_str();
        let name = captures.get(2).expect("name group").as_str().trim().to_string();
        let kind = PlaceholderKind::from_keyword(kind_text).ok_or_else(|| {
            ParserError::BadPlaceholderType(format!("{{{{{kind_text} {name}}}}}"))
        })?;
        found.push((kind, name));
    }
    Ok(found)
}

/// Cross-reference every declared id and every SQL placeholder against its
/// matching declaration (spec §4.2, §8): binding `key_param`s must name a
/// declared parameter, `applies_to` wrapper CTEs must have a `<cte>_base`
/// sibling, and every `{{config|param|bind|mat|import ...}}` placeholder
/// must resolve.
///
/// # Errors
///
/// Returns [`ParserError::UnknownRef`] for any dangling reference.
pub fn validate_cross_references(report: &Report) -> Result<(), ParserError> {
    let cte_map = cte_names(&report.sql);

    for binding in &report.metadata.bindings {
        if let ducksearch_core::BindingKey::Param(name) = &binding.key {
            if report.parameter(name).is_none() {
                return Err(ParserError::UnknownRef(format!(
                    "BINDINGS.{} references undeclared parameter {name}",
                    binding.id
                )));
            }
        }
    }

    for parameter in &report.parameters {
        if let Some(applies_to) = &parameter.applies_to {
            if applies_to.mode == AppliesToMode::Wrapper {
                let sibling = format!("{}_base", applies_to.cte);
                if !cte_map.contains_key(&sibling) {
                    return Err(ParserError::UnknownRef(format!(
                        "PARAMS.{} applies_to wrapper {} expects sibling CTE {sibling}",
                        parameter.name, applies_to.cte
                    )));
                }
            } else if !cte_map.contains_key(&applies_to.cte) {
                return Err(ParserError::UnknownRef(format!(
                    "PARAMS.{} applies_to references unknown CTE {}",
                    parameter.name, applies_to.cte
                )));
            }
        }
    }

    let import_ids: BTreeSet<_> = report.metadata.imports.iter().map(|i| i.id.clone()).collect();
    let binding_ids: BTreeSet<_> = report.metadata.bindings.iter().map(|b| b.id.clone()).collect();

    for (kind, name) in scan_placeholders(&report.sql)? {
        let resolved = match kind {
            PlaceholderKind::Config => report.metadata.config.contains_key(&name),
            PlaceholderKind::Param => report.parameter(&name).is_some(),
            PlaceholderKind::Bind => binding_ids.contains(&name),
            PlaceholderKind::Mat => cte_map.get(&name).copied().unwrap_or(false),
            PlaceholderKind::Import => import_ids.contains(&name),
            PlaceholderKind::Ident | PlaceholderKind::Path => true,
        };
        if !resolved {
            return Err(ParserError::UnknownRef(format!(
                "placeholder {{{{{kw} {name}}}}} does not resolve",
                kw = placeholder_keyword(kind)
            )));
        }
    }

    Ok(())
}

fn placeholder_keyword(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Config => "config",
        PlaceholderKind::Param => "param",
        PlaceholderKind::Bind => "bind",
        PlaceholderKind::Mat => "mat",
        PlaceholderKind::Import => "import",
        PlaceholderKind::Ident => "ident",
        PlaceholderKind::Path => "path",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    OnStack,
    Done,
}

/// Detect cycles within a single report's `BINDINGS`/`IMPORTS` metadata,
/// using three-color DFS over a graph whose nodes are binding and import
/// ids and whose edges are each entry's raw `source` (bindings) or
/// `report` (imports) value — a cycle exists only when that value happens
/// to name another declared id, exactly as the original linter treats it
/// (this is a narrower, metadata-only check; the cross-report import
/// cycle that most `IMPORTS` loops trip is caught separately, during
/// recursive execution).
///
/// # Errors
///
/// Returns [`ParserError::Cycle`] naming the id where the cycle was
/// detected.
pub fn detect_dependency_cycles(report: &Report) -> Result<(), ParserError> {
    let mut nodes: BTreeSet<String> = BTreeSet::new();
    let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for binding in &report.metadata.bindings {
        nodes.insert(binding.id.clone());
        if !binding.source.is_empty() {
            edges.entry(binding.id.clone()).or_default().insert(binding.source.clone());
        }
    }
    for import in &report.metadata.imports {
        nodes.insert(import.id.clone());
        if !import.report.is_empty() {
            edges.entry(import.id.clone()).or_default().insert(import.report.clone());
        }
    }

    let mut state: BTreeMap<String, VisitState> = BTreeMap::new();
    for id in &nodes {
        if !state.contains_key(id) {
            visit(id, &nodes, &edges, &mut state)?;
        }
    }
    Ok(())
}

fn visit(
    node: &str,
    nodes: &BTreeSet<String>,
    edges: &BTreeMap<String, BTreeSet<String>>,
    state: &mut BTreeMap<String, VisitState>,
) -> Result<(), ParserError> {
    state.insert(node.to_string(), VisitState::OnStack);
    if let Some(targets) = edges.get(node) {
        for next in targets {
            if !nodes.contains(next) {
                continue;
            }
            match state.get(next) {
                Some(VisitState::OnStack) => {
                    return Err(ParserError::Cycle(format!(
                        "dependency cycle detected involving {next}"
                    )));
                }
                Some(VisitState::Done) => continue,
                None => visit(next, nodes, edges, state)?,
            }
        }
    }
    state.insert(node.to_string(), VisitState::Done);
    Ok(())
}

const ILLEGAL_KEYWORDS: &[&str] = &[
    "ATTACH", "INSTALL", "LOAD", "PRAGMA", "SET", "CREATE", "ALTER", "DROP", "INSERT", "UPDATE",
    "DELETE",
];

fn copy_to_parquet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)COPY\b.*\bTO\b.*\bFORMAT\b.*\bPARQUET\b").expect("valid regex"))
}

/// Reject SQL constructs with side effects outside read-only analytics,
/// carving out `COPY (...) TO '<path>' (FORMAT PARQUET)` as the one
/// sanctioned write form (spec §4.2, §8).
///
/// # Errors
///
/// Returns [`ParserError::IllegalSql`] naming the offending keyword.
pub fn validate_sql_constructs(sql: &str) -> Result<(), ParserError> {
    let stripped = crate::sql_scan::strip_comments(sql);
    let upper = stripped.to_ascii_uppercase();

    for keyword in ILLEGAL_KEYWORDS {
        if keyword_appears(&upper, keyword) {
            return Err(ParserError::IllegalSql(format!("use of {keyword} is not permitted")));
        }
    }

    let mut search_from = 0usize;
    while let Some(offset) = upper[search_from..].find("COPY") {
        let at = search_from + offset;
        let is_word_start = at == 0 || !is_word_byte(upper.as_bytes()[at - 1]);
        if is_word_start {
            let tail = &stripped[at..];
            if !copy_to_parquet_re().is_match(tail) {
                return Err(ParserError::IllegalSql(
                    "COPY is only permitted as COPY (...) TO '<path>' (FORMAT PARQUET)"
                        .to_string(),
                ));
            }
        }
        search_from = at + 4;
    }

    Ok(())
}

fn keyword_appears(upper_sql: &str, keyword: &str) -> bool {
    let bytes = upper_sql.as_bytes();
    let kw = keyword.as_bytes();
    let mut i = 0usize;
    while let Some(pos) = find_from(bytes, kw, i) {
        let before_ok = pos == 0 || !is_word_byte(bytes[pos - 1]);
        let after = pos + kw.len();
        let after_ok = after >= bytes.len() || !is_word_byte(bytes[after]);
        if before_ok && after_ok {
            return true;
        }
        i = pos + 1;
    }
    false
}

/// Word-constituent per regex `\w`/`\b` semantics: alphanumeric or `_`.
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Converts a byte offset into `s` to the char index `sql_scan` expects.
fn char_index(s: &str, byte_index: usize) -> usize {
    s[..byte_index].chars().count()
}

fn parquet_scan_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)parquet_scan\s*\(").expect("valid regex"))
}

/// Every `parquet_scan(...)` call's first argument must be a single
/// string literal or a `{{bind name}}` / `{{path name}}` placeholder —
/// never a bare identifier or a `||` string concatenation, which would
/// let a caller read an arbitrary path off the filesystem (spec §4.2, §8).
///
/// # Errors
///
/// Returns [`ParserError::BadParquetPath`] for a disallowed argument
/// shape.
pub fn validate_parquet_paths(sql: &str) -> Result<(), ParserError> {
    let stripped = crate::sql_scan::strip_comments(sql);

    for call in parquet_scan_re().find_iter(&stripped) {
        let open = char_index(&stripped, call.end());
        let (body, _end) = crate::sql_scan::extract_parenthetical(&stripped, open)
            .ok_or_else(|| ParserError::BadParquetPath("unbalanced parquet_scan(...)".to_string()))?;
        let arg = crate::sql_scan::first_argument(&body).trim();

        let is_string_literal = arg.len() >= 2
            && !arg.contains("||")
            && ((arg.starts_with('\'') && arg.ends_with('\''))
                || (arg.starts_with('"') && arg.ends_with('"')));
        let is_placeholder = placeholder_re().is_match(arg)
            && matches!(
                placeholder_re().captures(arg).and_then(|c| c.get(1)).map(|m| m.as_str()),
                Some("bind" | "path")
            );

        if !is_string_literal && !is_placeholder {
            return Err(ParserError::BadParquetPath(format!(
                "parquet_scan argument must be a string literal or {{{{bind|path ...}}}}, found: {arg}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducksearch_core::{ParameterScope, PrimitiveType};

    #[test]
    fn parses_primitive_param() {
        let params = parse_params("widget_id: int (scope=data)", "").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "widget_id");
        assert!(matches!(
            params[0].param_type,
            ParameterType::Primitive(PrimitiveType::Int)
        ));
        assert_eq!(params[0].scope, ParameterScope::Data);
    }

    #[test]
    fn parses_nested_optional_list_type() {
        let params = parse_params("tags: Optional[List[str]] (scope=view)", "").unwrap();
        assert!(matches!(
            &params[0].param_type,
            ParameterType::Optional(inner) if matches!(**inner, ParameterType::List(_))
        ));
    }

    #[test]
    fn parses_literal_type_with_quoted_values() {
        let params = parse_params("status: Literal['active', 'inactive'] (scope=data)", "").unwrap();
        match &params[0].param_type {
            ParameterType::Literal(values) => assert_eq!(values.len(), 2),
            other => panic!("unexpected type: {other:?}"),
        }
    }

    #[test]
    fn parses_applies_to_wrapper() {
        let params =
            parse_params("widget_id: int (scope=hybrid, applies_to=widgets:wrapper)", "").unwrap();
        let applies_to = params[0].applies_to.as_ref().unwrap();
        assert_eq!(applies_to.cte, "widgets");
        assert_eq!(applies_to.mode, AppliesToMode::Wrapper);
    }

    #[test]
    fn rejects_unknown_scope() {
        let err = parse_params("x: int (scope=bogus)", "").unwrap_err();
        assert!(matches!(err, ParserError::BadScope(_)));
    }

    #[test]
    fn rejects_duplicate_param_names_case_insensitively() {
        let err = parse_params("Widget: int (scope=data)\nwidget: int (scope=data)", "").unwrap_err();
        assert!(matches!(err, ParserError::DuplicateId(_)));
    }

    #[test]
    fn omitted_scope_with_no_attrs_clause_infers_data_from_param_placeholder() {
        let params = parse_params(
            "widget_id: Optional[int]",
            "SELECT * FROM widgets WHERE {{param widget_id}} IS NULL OR id = {{param widget_id}}",
        )
        .unwrap();
        assert_eq!(params[0].scope, ParameterScope::Data);
        assert!(params[0].applies_to.is_none());
    }

    #[test]
    fn omitted_scope_infers_data_from_ident_placeholder_case_insensitive_keyword() {
        let params = parse_params("sort_col: InjectedStr", "SELECT * FROM t ORDER BY {{IDENT sort_col}}").unwrap();
        assert_eq!(params[0].scope, ParameterScope::Data);
    }

    #[test]
    fn omitted_scope_with_no_matching_placeholder_infers_view() {
        let params = parse_params("page_size: int", "SELECT * FROM widgets").unwrap();
        assert_eq!(params[0].scope, ParameterScope::View);
    }

    #[test]
    fn cte_names_distinguishes_materialized() {
        let sql = "WITH base AS (SELECT 1), mat AS MATERIALIZE (SELECT 2) SELECT * FROM mat";
        let names = cte_names(sql);
        assert_eq!(names.get("base"), Some(&false));
        assert_eq!(names.get("mat"), Some(&true));
    }

    #[test]
    fn rejects_drop_statement() {
        let err = validate_sql_constructs("DROP TABLE widgets").unwrap_err();
        assert!(matches!(err, ParserError::IllegalSql(_)));
    }

    #[test]
    fn allows_copy_to_parquet() {
        validate_sql_constructs("COPY (SELECT 1) TO 'out.parquet' (FORMAT PARQUET)").unwrap();
    }

    #[test]
    fn rejects_copy_without_parquet_format() {
        let err = validate_sql_constructs("COPY (SELECT 1) TO 'out.csv' (FORMAT CSV)").unwrap_err();
        assert!(matches!(err, ParserError::IllegalSql(_)));
    }

    #[test]
    fn rejects_parquet_scan_with_concatenation() {
        let err =
            validate_parquet_paths("SELECT * FROM parquet_scan('base/' || region || '.parquet')")
                .unwrap_err();
        assert!(matches!(err, ParserError::BadParquetPath(_)));
    }

    #[test]
    fn allows_parquet_scan_with_bind_placeholder() {
        validate_parquet_paths("SELECT * FROM parquet_scan({{bind widget_path}})").unwrap();
    }

    #[test]
    fn allows_parquet_scan_with_string_literal() {
        validate_parquet_paths("SELECT * FROM parquet_scan('cache/artifacts/x.parquet')").unwrap();
    }

    #[test]
    fn allows_parquet_scan_with_double_quoted_literal() {
        validate_parquet_paths(r#"SELECT * FROM parquet_scan("cache/artifacts/x.parquet")"#).unwrap();
    }

    #[test]
    fn allows_identifiers_containing_illegal_keywords_as_a_prefix() {
        validate_sql_constructs(
            "SELECT update_time, insert_id, load_date, set_name, drop_reason, delete_flag FROM widgets",
        )
        .unwrap();
    }

    #[test]
    fn allows_copy_with_extra_options_and_unparenthesized_source() {
        validate_sql_constructs("COPY widgets TO 'out.parquet' (FORMAT PARQUET, COMPRESSION 'zstd')")
            .unwrap();
    }
}
