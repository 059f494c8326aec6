//! SQL literal rendering shared by the materialization rewrite and the
//! placeholder substitution passes.

use ducksearch_core::LiteralValue;

#[cfg(test)]
use chrono::NaiveDate;

/// Render a single resolved value as a SQL literal: strings get
/// single-quoted with internal quotes doubled, numbers and booleans
/// render bare, `Null` renders as the `NULL` keyword.
#[must_use]
pub fn render_literal(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Str(s) => quote_sql_string(s),
        LiteralValue::Int(i) => i.to_string(),
        LiteralValue::Float(f) => f.to_string(),
        LiteralValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        LiteralValue::Date(d) => format!("DATE '{d}'"),
        LiteralValue::DateTime(dt) => format!("TIMESTAMP '{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        LiteralValue::Null => "NULL".to_string(),
    }
}

/// Render a list of values as a parenthesized, comma-separated SQL
/// literal list: `(1, 2, 3)`.
#[must_use]
pub fn render_literal_list(values: &[LiteralValue]) -> String {
    let rendered = values.iter().map(render_literal).collect::<Vec<_>>().join(", ");
    format!("({rendered})")
}

/// Single-quote a string for use as a SQL string literal, doubling any
/// embedded single quotes.
#[must_use]
pub fn quote_sql_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render a filesystem path as a quoted SQL string literal suitable for
/// `parquet_scan(...)`.
#[must_use]
pub fn quote_path(path: &str) -> String {
    quote_sql_string(path)
}

/// Render a SQL identifier for `{{ident ...}}` substitution: bare when
/// `name` is already a plain identifier, double-quoted (with embedded
/// quotes doubled) otherwise (spec §4.3: "rendered as a bare identifier,
/// quoted if required by the dialect"). Callers are responsible for
/// having validated `name` comes from an `InjectedStr` /
/// `InjectedIdentLiteral`-typed parameter.
#[must_use]
pub fn render_ident(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_escapes_strings() {
        assert_eq!(quote_sql_string("it's"), "'it''s'");
    }

    #[test]
    fn renders_literal_list_with_mixed_types() {
        let values = vec![LiteralValue::Str("a".into()), LiteralValue::Int(2)];
        assert_eq!(render_literal_list(&values), "('a', 2)");
    }

    #[test]
    fn renders_bool_as_sql_keyword() {
        assert_eq!(render_literal(&LiteralValue::Bool(true)), "TRUE");
        assert_eq!(render_literal(&LiteralValue::Bool(false)), "FALSE");
    }

    #[test]
    fn renders_date_as_dialect_literal() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        assert_eq!(render_literal(&LiteralValue::Date(date)), "DATE '2024-03-14'");
    }

    #[test]
    fn renders_datetime_as_dialect_literal() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(
            render_literal(&LiteralValue::DateTime(dt)),
            "TIMESTAMP '2024-03-14 09:30:00'"
        );
    }

    #[test]
    fn renders_plain_ident_bare() {
        assert_eq!(render_ident("region_name"), "region_name");
    }

    #[test]
    fn quotes_ident_with_special_characters() {
        assert_eq!(render_ident("region name"), "\"region name\"");
        assert_eq!(render_ident("weird\"col"), "\"weird\"\"col\"");
    }
}
