//! Rewrites `name AS MATERIALIZE[_CLOSED] (body)` CTE definitions into
//! plain `name AS (body)`, lifting each materialized body out into its own
//! entry so the execution pipeline can run it as an independent statement
//! and cache its result to `cache/materialize/<key>__<name>.parquet`
//! (spec §5, C3/C4).
//!
//! `MATERIALIZE_CLOSED` differs from `MATERIALIZE` only in whether later
//! stages may reference the parent query's other CTEs when re-running the
//! body standalone; both are rewritten identically here, and the
//! distinction is carried by the caller via the boolean in
//! [`ducksearch_parser::lint::cte_names`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::CompilerError;
use ducksearch_parser::sql_scan;

fn materialize_def_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([A-Za-z_][A-Za-z0-9_]*)\s+AS\s+MATERIALIZE(?:_CLOSED)?\s*\(")
            .expect("valid regex")
    })
}

/// Split `sql` into the main statement (with every `MATERIALIZE[_CLOSED]`
/// CTE rewritten to a plain `AS (...)`) and a name→body map of the
/// extracted materialization bodies, in source order.
///
/// # Errors
///
/// Returns [`CompilerError::MalformedMaterialize`] if a `MATERIALIZE`
/// keyword isn't followed by a balanced parenthesized body.
pub fn rewrite_materializations(
    sql: &str,
) -> Result<(String, BTreeMap<String, String>), CompilerError> {
    let mut rewritten = String::with_capacity(sql.len());
    let mut bodies = BTreeMap::new();
    let mut cursor = 0usize;

    loop {
        let Some(captures) = materialize_def_re().captures(&sql[cursor..]) else {
            rewritten.push_str(&sql[cursor..]);
            break;
        };

        let whole = captures.get(0).expect("group 0 always present");
        let name = captures.get(1).expect("cte name group").as_str().to_string();
        let match_start = cursor + whole.start();
        let open_paren = cursor + whole.end();

        rewritten.push_str(&sql[cursor..match_start]);

        let (body, close_idx) = sql_scan::extract_parenthetical(sql, char_index(sql, open_paren))
            .ok_or_else(|| {
                CompilerError::MalformedMaterialize(format!(
                    "unbalanced MATERIALIZE body for CTE {name}"
                ))
            })?;

        rewritten.push_str(&name);
        rewritten.push_str(" AS (");
        rewritten.push_str(body.trim());
        rewritten.push(')');

        bodies.insert(name, body.trim().to_string());
        cursor = byte_index(sql, close_idx) + 1;
    }

    Ok((rewritten, bodies))
}

fn char_index(s: &str, byte_index: usize) -> usize {
    s[..byte_index].chars().count()
}

fn byte_index(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map_or(s.len(), |(b, _)| b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_single_materialize_cte() {
        let sql = "WITH widgets AS MATERIALIZE (SELECT * FROM source) SELECT * FROM widgets";
        let (rewritten, bodies) = rewrite_materializations(sql).unwrap();
        assert_eq!(rewritten, "WITH widgets AS (SELECT * FROM source) SELECT * FROM widgets");
        assert_eq!(bodies.get("widgets").unwrap(), "SELECT * FROM source");
    }

    #[test]
    fn rewrites_materialize_closed_identically() {
        let sql = "WITH w AS MATERIALIZE_CLOSED (SELECT 1) SELECT * FROM w";
        let (rewritten, bodies) = rewrite_materializations(sql).unwrap();
        assert_eq!(rewritten, "WITH w AS (SELECT 1) SELECT * FROM w");
        assert_eq!(bodies.get("w").unwrap(), "SELECT 1");
    }

    #[test]
    fn rewrites_multiple_materialize_ctes() {
        let sql = "WITH a AS MATERIALIZE (SELECT 1), b AS MATERIALIZE (SELECT 2) SELECT * FROM a, b";
        let (rewritten, bodies) = rewrite_materializations(sql).unwrap();
        assert_eq!(bodies.len(), 2);
        assert!(rewritten.contains("a AS (SELECT 1)"));
        assert!(rewritten.contains("b AS (SELECT 2)"));
    }

    #[test]
    fn leaves_plain_ctes_untouched() {
        let sql = "WITH a AS (SELECT 1) SELECT * FROM a";
        let (rewritten, bodies) = rewrite_materializations(sql).unwrap();
        assert_eq!(rewritten, sql);
        assert!(bodies.is_empty());
    }

    #[test]
    fn handles_nested_parens_in_materialize_body() {
        let sql = "WITH w AS MATERIALIZE (SELECT COUNT(*) FROM (SELECT 1) t) SELECT * FROM w";
        let (_rewritten, bodies) = rewrite_materializations(sql).unwrap();
        assert_eq!(bodies.get("w").unwrap(), "SELECT COUNT(*) FROM (SELECT 1) t");
    }
}
