//! C2 (part one): metadata-block extraction and [`Report`] assembly.
//!
//! Report files are plain `.sql` with embedded `/*** NAME ... ***/` metadata
//! blocks (spec §3). This module finds those blocks, parses their YAML
//! bodies into the typed [`Metadata`] shape, strips them out of the SQL,
//! and enforces that exactly one statement remains. Parameter-grammar
//! parsing and cross-reference validation live in [`crate::lint`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use ducksearch_core::{
    BindingEntry, BindingKey, CacheConfig, ImportEntry, LiteralSourceEntry, Metadata, Report,
    ValueMode,
};
use regex::Regex;

use crate::error::ParserError;
use crate::lint;
use crate::sql_scan;

/// The 13 block names a report may declare. Six are interpreted here
/// (`CONFIG`, `CACHE`, `PARAMS`, `LITERAL_SOURCES`, `BINDINGS`, `IMPORTS`);
/// the remaining seven are reserved for collaborators outside this scope
/// and are only schema-checked (must parse as a YAML mapping or sequence).
pub const SUPPORTED_BLOCKS: [&str; 13] = [
    "CONFIG",
    "CACHE",
    "PARAMS",
    "LITERAL_SOURCES",
    "BINDINGS",
    "IMPORTS",
    "SOURCES",
    "TABLE",
    "SEARCH",
    "FACETS",
    "CHARTS",
    "DERIVED_PARAMS",
    "SECRETS",
];

const RESERVED_BLOCKS: [&str; 7] = [
    "SOURCES",
    "TABLE",
    "SEARCH",
    "FACETS",
    "CHARTS",
    "DERIVED_PARAMS",
    "SECRETS",
];

fn metadata_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*{3}([A-Z_]+)\s*(.*?)\*{3}/").expect("valid regex"))
}

/// Parse a report file's full text into a [`Report`].
///
/// # Errors
///
/// Returns [`ParserError::UnsupportedBlock`] for an unrecognized block
/// name, [`ParserError::SchemaInvalid`] for a block whose YAML body
/// doesn't parse or doesn't match its expected shape, and
/// [`ParserError::MultipleStatements`] if the SQL remaining after block
/// stripping isn't exactly one statement.
pub fn parse_report(source: &str) -> Result<Report, ParserError> {
    let (remaining_sql, blocks) = extract_blocks(source)?;

    let statements = sql_scan::split_top_level_statements(&remaining_sql);
    if statements.len() != 1 {
        return Err(ParserError::MultipleStatements(statements.len()));
    }

    let metadata = build_metadata(&blocks)?;
    let sql = statements.into_iter().next().expect("checked len == 1");
    let parameters = match blocks.get("PARAMS") {
        Some(body) => lint::parse_params(body, &sql)?,
        None => Vec::new(),
    };

    Ok(Report { sql, metadata, parameters })
}

/// Strip every `/*** NAME ... ***/` block out of `source`, returning the
/// leftover SQL and a name→body map of what was found.
fn extract_blocks(source: &str) -> Result<(String, BTreeMap<String, String>), ParserError> {
    let mut blocks = BTreeMap::new();
    let mut remaining = String::with_capacity(source.len());
    let mut cursor = 0usize;

    for capture in metadata_re().captures_iter(source) {
        let whole = capture.get(0).expect("group 0 always present");
        let name = capture.get(1).expect("block name group").as_str().to_string();
        let body = capture.get(2).expect("block body group").as_str().trim().to_string();

        if !SUPPORTED_BLOCKS.contains(&name.as_str()) {
            return Err(ParserError::UnsupportedBlock(name));
        }
        if blocks.insert(name.clone(), body).is_some() {
            return Err(ParserError::SchemaInvalid(format!(
                "duplicate metadata block: {name}"
            )));
        }

        remaining.push_str(&source[cursor..whole.start()]);
        cursor = whole.end();
    }
    remaining.push_str(&source[cursor..]);

    Ok((remaining, blocks))
}

fn parse_yaml(body: &str, block: &str) -> Result<serde_yaml::Value, ParserError> {
    serde_yaml::from_str(body)
        .map_err(|e| ParserError::SchemaInvalid(format!("{block} is not valid YAML: {e}")))
}

fn yaml_str(value: &serde_yaml::Value, block: &str, field: &str) -> Result<String, ParserError> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| ParserError::SchemaInvalid(format!("{block}.{field} must be a string")))
}

fn build_metadata(blocks: &BTreeMap<String, String>) -> Result<Metadata, ParserError> {
    let mut metadata = Metadata::default();

    if let Some(body) = blocks.get("CONFIG") {
        let value = parse_yaml(body, "CONFIG")?;
        let mapping = value
            .as_mapping()
            .ok_or_else(|| ParserError::SchemaInvalid("CONFIG must be a mapping".to_string()))?;
        for (key, type_hint) in mapping {
            let key = yaml_str(key, "CONFIG", "key")?;
            let type_hint = yaml_str(type_hint, "CONFIG", &key)?;
            metadata.config.insert(key, type_hint);
        }
    }

    if let Some(body) = blocks.get("CACHE") {
        let value = parse_yaml(body, "CACHE")?;
        let mapping = value
            .as_mapping()
            .ok_or_else(|| ParserError::SchemaInvalid("CACHE must be a mapping".to_string()))?;
        let ttl_seconds = match mapping.get("ttl_seconds") {
            Some(raw) => {
                let ttl = raw.as_u64().ok_or_else(|| {
                    ParserError::SchemaInvalid(
                        "CACHE.ttl_seconds must be a positive integer".to_string(),
                    )
                })?;
                if ttl == 0 {
                    return Err(ParserError::SchemaInvalid(
                        "CACHE.ttl_seconds must be a positive integer".to_string(),
                    ));
                }
                Some(ttl)
            }
            None => None,
        };
        metadata.cache = Some(CacheConfig { ttl_seconds });
    }

    if let Some(body) = blocks.get("LITERAL_SOURCES") {
        metadata.literal_sources = parse_literal_sources(body)?;
    }

    if let Some(body) = blocks.get("BINDINGS") {
        metadata.bindings = parse_bindings(body)?;
    }

    if let Some(body) = blocks.get("IMPORTS") {
        metadata.imports = parse_imports(body)?;
    }

    for name in RESERVED_BLOCKS {
        if let Some(body) = blocks.get(name) {
            let value = parse_yaml(body, name)?;
            if !value.is_mapping() && !value.is_sequence() {
                return Err(ParserError::SchemaInvalid(format!(
                    "{name} must be a mapping or sequence"
                )));
            }
            let json = serde_json::to_value(&value)
                .map_err(|e| ParserError::SchemaInvalid(format!("{name}: {e}")))?;
            metadata.reserved.insert(name.to_string(), json);
        }
    }

    Ok(metadata)
}

fn parse_literal_sources(body: &str) -> Result<Vec<LiteralSourceEntry>, ParserError> {
    let value = parse_yaml(body, "LITERAL_SOURCES")?;
    let sequence = value.as_sequence().ok_or_else(|| {
        ParserError::SchemaInvalid("LITERAL_SOURCES must be a sequence".to_string())
    })?;

    let mut entries = Vec::with_capacity(sequence.len());
    let mut seen = std::collections::HashSet::new();
    for item in sequence {
        let mapping = item.as_mapping().ok_or_else(|| {
            ParserError::SchemaInvalid("LITERAL_SOURCES entries must be mappings".to_string())
        })?;
        let id = yaml_str(
            mapping.get("id").ok_or_else(|| {
                ParserError::SchemaInvalid("LITERAL_SOURCES entry missing id".to_string())
            })?,
            "LITERAL_SOURCES",
            "id",
        )?;
        if !seen.insert(id.clone()) {
            return Err(ParserError::DuplicateId(id));
        }
        let from_cte = yaml_str(
            mapping.get("from_cte").ok_or_else(|| {
                ParserError::SchemaInvalid(format!("LITERAL_SOURCES.{id} missing from_cte"))
            })?,
            "LITERAL_SOURCES",
            "from_cte",
        )?;
        let value_column = yaml_str(
            mapping.get("value_column").ok_or_else(|| {
                ParserError::SchemaInvalid(format!("LITERAL_SOURCES.{id} missing value_column"))
            })?,
            "LITERAL_SOURCES",
            "value_column",
        )?;
        entries.push(LiteralSourceEntry { id, from_cte, value_column });
    }
    Ok(entries)
}

fn parse_bindings(body: &str) -> Result<Vec<BindingEntry>, ParserError> {
    let value = parse_yaml(body, "BINDINGS")?;
    let sequence = value
        .as_sequence()
        .ok_or_else(|| ParserError::SchemaInvalid("BINDINGS must be a sequence".to_string()))?;

    let mut entries = Vec::with_capacity(sequence.len());
    let mut seen = std::collections::HashSet::new();
    for item in sequence {
        let mapping = item.as_mapping().ok_or_else(|| {
            ParserError::SchemaInvalid("BINDINGS entries must be mappings".to_string())
        })?;
        let id = yaml_str(
            mapping
                .get("id")
                .ok_or_else(|| ParserError::SchemaInvalid("BINDINGS entry missing id".to_string()))?,
            "BINDINGS",
            "id",
        )?;
        if !seen.insert(id.clone()) {
            return Err(ParserError::DuplicateId(id));
        }
        let source = yaml_str(
            mapping.get("source").ok_or_else(|| {
                ParserError::SchemaInvalid(format!("BINDINGS.{id} missing source"))
            })?,
            "BINDINGS",
            "source",
        )?;
        let key_column = yaml_str(
            mapping.get("key_column").ok_or_else(|| {
                ParserError::SchemaInvalid(format!("BINDINGS.{id} missing key_column"))
            })?,
            "BINDINGS",
            "key_column",
        )?;
        let value_column = yaml_str(
            mapping.get("value_column").ok_or_else(|| {
                ParserError::SchemaInvalid(format!("BINDINGS.{id} missing value_column"))
            })?,
            "BINDINGS",
            "value_column",
        )?;
        let kind = yaml_str(
            mapping
                .get("kind")
                .ok_or_else(|| ParserError::SchemaInvalid(format!("BINDINGS.{id} missing kind")))?,
            "BINDINGS",
            "kind",
        )?;

        let key_param = mapping.get("key_param");
        let key_sql = mapping.get("key_sql");
        let key = match (key_param, key_sql) {
            (Some(p), None) => BindingKey::Param(yaml_str(p, "BINDINGS", "key_param")?),
            (None, Some(s)) => BindingKey::Sql(yaml_str(s, "BINDINGS", "key_sql")?),
            (Some(_), Some(_)) => {
                return Err(ParserError::SchemaInvalid(format!(
                    "BINDINGS.{id} must set exactly one of key_param or key_sql, found both"
                )));
            }
            (None, None) => {
                return Err(ParserError::SchemaInvalid(format!(
                    "BINDINGS.{id} must set exactly one of key_param or key_sql"
                )));
            }
        };

        let value_mode = match mapping.get("value_mode") {
            Some(raw) => {
                let keyword = yaml_str(raw, "BINDINGS", "value_mode")?;
                ValueMode::from_keyword(&keyword).ok_or_else(|| {
                    ParserError::SchemaInvalid(format!(
                        "BINDINGS.{id} has unknown value_mode: {keyword}"
                    ))
                })?
            }
            None => ValueMode::Single,
        };

        entries.push(BindingEntry {
            id,
            source,
            key_column,
            value_column,
            kind,
            key,
            value_mode,
        });
    }
    Ok(entries)
}

fn parse_imports(body: &str) -> Result<Vec<ImportEntry>, ParserError> {
    let value = parse_yaml(body, "IMPORTS")?;
    let sequence = value
        .as_sequence()
        .ok_or_else(|| ParserError::SchemaInvalid("IMPORTS must be a sequence".to_string()))?;

    let mut entries = Vec::with_capacity(sequence.len());
    let mut seen = std::collections::HashSet::new();
    for item in sequence {
        let mapping = item.as_mapping().ok_or_else(|| {
            ParserError::SchemaInvalid("IMPORTS entries must be mappings".to_string())
        })?;
        let id = yaml_str(
            mapping
                .get("id")
                .ok_or_else(|| ParserError::SchemaInvalid("IMPORTS entry missing id".to_string()))?,
            "IMPORTS",
            "id",
        )?;
        if !seen.insert(id.clone()) {
            return Err(ParserError::DuplicateId(id));
        }
        let report = yaml_str(
            mapping
                .get("report")
                .ok_or_else(|| ParserError::SchemaInvalid(format!("IMPORTS.{id} missing report")))?,
            "IMPORTS",
            "report",
        )?;
        let pass_params = match mapping.get("pass_params") {
            Some(raw) => {
                let seq = raw.as_sequence().ok_or_else(|| {
                    ParserError::SchemaInvalid(format!(
                        "IMPORTS.{id}.pass_params must be a sequence"
                    ))
                })?;
                seq.iter()
                    .map(|v| yaml_str(v, "IMPORTS", "pass_params"))
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => Vec::new(),
        };
        entries.push(ImportEntry { id, report, pass_params });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_metadata_blocks_and_keeps_sql() {
        let source = "/*** CONFIG\nbase_path: str\n***/\nSELECT 1;";
        let (remaining, blocks) = extract_blocks(source).unwrap();
        assert_eq!(remaining.trim(), "SELECT 1;");
        assert!(blocks.contains_key("CONFIG"));
    }

    #[test]
    fn unsupported_block_name_is_rejected() {
        let source = "/*** BOGUS\nfoo: bar\n***/\nSELECT 1;";
        let err = extract_blocks(source).unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedBlock(_)));
    }

    #[test]
    fn rejects_more_than_one_statement() {
        let source = "SELECT 1; SELECT 2;";
        let err = parse_report(source).unwrap_err();
        assert!(matches!(err, ParserError::MultipleStatements(2)));
    }

    #[test]
    fn parses_full_report_with_cache_and_bindings() {
        let source = "/*** CACHE\nttl_seconds: 60\n***/\n\
/*** BINDINGS\n- id: widget_lookup\n  source: widgets\n  key_column: id\n  value_column: name\n  kind: dimension\n  key_param: widget_id\n  value_mode: single\n***/\n\
SELECT * FROM widgets;";
        let report = parse_report(source).unwrap();
        assert_eq!(report.sql.trim(), "SELECT * FROM widgets;");
        assert_eq!(report.metadata.cache.unwrap().ttl_seconds, Some(60));
        assert_eq!(report.metadata.bindings.len(), 1);
        assert_eq!(report.metadata.bindings[0].id, "widget_lookup");
    }

    #[test]
    fn binding_with_both_key_variants_is_rejected() {
        let source = "/*** BINDINGS\n- id: x\n  source: s\n  key_column: k\n  value_column: v\n  kind: dim\n  key_param: a\n  key_sql: SELECT 1\n***/\nSELECT 1;";
        let err = parse_report(source).unwrap_err();
        assert!(matches!(err, ParserError::SchemaInvalid(_)));
    }

    #[test]
    fn zero_ttl_seconds_is_rejected() {
        let source = "/*** CACHE\nttl_seconds: 0\n***/\nSELECT 1;";
        let err = parse_report(source).unwrap_err();
        assert!(matches!(err, ParserError::SchemaInvalid(_)));
    }
}
