//! Integration coverage of the end-to-end report scenarios spec.md §8
//! calls out explicitly, driven through the public `lint_report` entry
//! point rather than individual internal functions.

use ducksearch_parser::{lint_report, ParserError};
use pretty_assertions::assert_eq;

#[test]
fn optional_int_widget_report_lints_cleanly() {
    let source = "/*** PARAMS\nWidget: Optional[int] (scope=data)\n***/\n\
SELECT id FROM (VALUES (1), (2)) t(id) WHERE {{param Widget}} IS NULL OR id = {{param Widget}};";

    let report = lint_report(source).unwrap();
    assert_eq!(report.parameters.len(), 1);
    assert_eq!(report.parameters[0].name, "Widget");
    assert_eq!(report.sql.matches("{{param Widget}}").count(), 2);
}

#[test]
fn import_report_with_placeholder_lints_and_declares_the_import() {
    // `{{import X}}` expands to a bare quoted path literal at substitution
    // time (ducksearch-compiler::substitute) — DuckDB reads a parquet file
    // referenced directly in a FROM clause, so the source SQL uses it bare.
    let source = "/*** IMPORTS\n- id: X\n  report: other.sql\n***/\n\
SELECT * FROM {{import X}};";

    let report = lint_report(source).unwrap();
    assert_eq!(report.metadata.imports.len(), 1);
    assert_eq!(report.metadata.imports[0].id, "X");
    assert_eq!(report.metadata.imports[0].report, "other.sql");
}

#[test]
fn binding_with_materialize_closed_source_lints_cleanly() {
    let source = "/*** PARAMS\nP: int (scope=data)\n***/\n\
/*** BINDINGS\n- id: K\n  source: vals\n  key_column: k\n  value_column: v\n  kind: demo\n  key_param: P\n***/\n\
WITH vals AS MATERIALIZE_CLOSED (SELECT * FROM (VALUES (1, 'a'), (2, 'b')) t(k, v)) \
SELECT {{bind K}} AS label;";

    let report = lint_report(source).unwrap();
    assert_eq!(report.metadata.bindings.len(), 1);
    assert_eq!(report.metadata.bindings[0].source, "vals");
}

#[test]
fn delete_statement_is_rejected_as_illegal_sql() {
    let err = lint_report("DELETE FROM widgets;").unwrap_err();
    assert!(matches!(err, ParserError::IllegalSql(_)));
}

#[test]
fn two_top_level_statements_are_rejected() {
    let err = lint_report("SELECT 1; SELECT 2;").unwrap_err();
    assert!(matches!(err, ParserError::MultipleStatements(2)));
}

#[test]
fn wrapper_applies_to_without_base_sibling_is_rejected() {
    let source = "/*** PARAMS\nWidget: int (scope=hybrid, applies_to=widgets:wrapper)\n***/\n\
WITH widgets AS (SELECT 1 AS id) SELECT * FROM widgets;";

    let err = lint_report(source).unwrap_err();
    assert!(matches!(err, ParserError::UnknownRef(_)));
}

#[test]
fn wrapper_applies_to_with_base_sibling_lints_cleanly() {
    let source = "/*** PARAMS\nWidget: int (scope=hybrid, applies_to=widgets:wrapper)\n***/\n\
WITH widgets_base AS (SELECT 1 AS id), widgets AS (SELECT * FROM widgets_base WHERE {{param Widget}} IS NULL OR id = {{param Widget}}) \
SELECT * FROM widgets;";

    let report = lint_report(source).unwrap();
    assert_eq!(report.parameters[0].scope, ducksearch_core::ParameterScope::Hybrid);
}

#[test]
fn dangling_bind_placeholder_is_an_unknown_ref() {
    let err = lint_report("SELECT {{bind nonexistent}};").unwrap_err();
    assert!(matches!(err, ParserError::UnknownRef(_)));
}

#[test]
fn unsupported_metadata_block_name_is_fatal() {
    let source = "/*** TOTALLY_BOGUS\nfoo: bar\n***/\nSELECT 1;";
    let err = lint_report(source).unwrap_err();
    assert!(matches!(err, ParserError::UnsupportedBlock(_)));
}
