//! End-to-end coverage of the execution pipeline (spec §8): a real
//! in-memory DuckDB connection against a scratch project root built with
//! `tempfile`, driven entirely through `ducksearch_exec::execute_report`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use ducksearch_core::RootLayout;
use ducksearch_exec::ExecError;
use duckdb::Connection;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn make_valid_root() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "name = 'demo'\n").unwrap();
    fs::create_dir_all(dir.path().join("reports")).unwrap();
    fs::create_dir_all(dir.path().join("composites")).unwrap();
    for name in ducksearch_core::CACHE_SUBDIRS {
        fs::create_dir_all(dir.path().join("cache").join(name)).unwrap();
    }
    dir
}

fn write_report(dir: &TempDir, relative: &str, contents: &str) {
    let path = dir.path().join("reports").join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn layout_for(dir: &TempDir) -> RootLayout {
    ducksearch_parser::validate_root(dir.path()).unwrap()
}

fn read_ids(conn: &Connection, path: &Path) -> Vec<i64> {
    let sql = format!("SELECT id FROM read_parquet('{}') ORDER BY id", path.display());
    let mut statement = conn.prepare(&sql).unwrap();
    statement
        .query_map([], |row| row.get::<_, i64>(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

const WIDGET_REPORT: &str = "/*** PARAMS\nWidget: Optional[int] (scope=data)\n***/\n\
SELECT id FROM (VALUES (1), (2)) t(id) WHERE {{param Widget}} IS NULL OR id = {{param Widget}};";

#[test]
fn data_scope_param_filters_the_artifact_to_the_matching_row() {
    let dir = make_valid_root();
    write_report(&dir, "widget.sql", WIDGET_REPORT);
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let payload = BTreeMap::from([("Widget".to_string(), Value::from(2))]);
    let result =
        ducksearch_exec::execute_report(&layout, &conn, Path::new("widget.sql"), &payload, &BTreeMap::new(), None)
            .unwrap();

    assert_eq!(read_ids(&conn, &result.base), vec![2]);
}

#[test]
fn client_only_twin_never_filters_server_side() {
    let dir = make_valid_root();
    write_report(&dir, "widget.sql", WIDGET_REPORT);
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let payload = BTreeMap::from([("__client__Widget".to_string(), Value::from(2))]);
    let result =
        ducksearch_exec::execute_report(&layout, &conn, Path::new("widget.sql"), &payload, &BTreeMap::new(), None)
            .unwrap();

    assert_eq!(read_ids(&conn, &result.base), vec![1, 2]);
}

#[test]
fn import_execution_populates_the_imported_reports_own_cache_file() {
    let dir = make_valid_root();
    write_report(&dir, "child.sql", "SELECT id FROM (VALUES (1), (2)) t(id);");
    write_report(
        &dir,
        "parent.sql",
        "/*** IMPORTS\n- id: X\n  report: child.sql\n***/\nSELECT * FROM {{import X}};",
    );
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let result = ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("parent.sql"),
        &BTreeMap::new(),
        &BTreeMap::new(),
        None,
    )
    .unwrap();

    assert_eq!(read_ids(&conn, &result.base), vec![1, 2]);
    assert!(layout.artifacts_dir().join("child.parquet").exists());
}

#[test]
fn binding_resolves_through_its_key_param_to_the_matching_value() {
    let dir = make_valid_root();
    let source = "/*** PARAMS\nP: int (scope=data)\n***/\n\
/*** BINDINGS\n- id: K\n  source: vals\n  key_column: k\n  value_column: v\n  kind: demo\n  key_param: P\n***/\n\
WITH vals AS (SELECT * FROM (VALUES (1, 'a'), (2, 'b')) t(k, v)) \
SELECT {{bind K}} AS label;";
    write_report(&dir, "lookup.sql", source);
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let payload = BTreeMap::from([("P".to_string(), Value::from(2))]);
    let result =
        ducksearch_exec::execute_report(&layout, &conn, Path::new("lookup.sql"), &payload, &BTreeMap::new(), None)
            .unwrap();

    let sql = format!("SELECT label FROM read_parquet('{}')", result.base.display());
    let label: String = conn.query_row(&sql, [], |row| row.get(0)).unwrap();
    assert_eq!(label, "b");
}

#[test]
fn delete_statement_fails_execution_as_illegal_sql() {
    let dir = make_valid_root();
    write_report(&dir, "bad.sql", "DELETE FROM widgets;");
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let err = ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("bad.sql"),
        &BTreeMap::new(),
        &BTreeMap::new(),
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ExecError::Parser(ducksearch_parser::ParserError::IllegalSql(_))
    ));
}

#[test]
fn two_statements_fail_execution_as_multiple_statements() {
    let dir = make_valid_root();
    write_report(&dir, "bad.sql", "SELECT 1; SELECT 2;");
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let err = ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("bad.sql"),
        &BTreeMap::new(),
        &BTreeMap::new(),
        None,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ExecError::Parser(ducksearch_parser::ParserError::MultipleStatements(2))
    ));
}

#[test]
fn mutually_importing_reports_are_rejected_as_a_cycle() {
    let dir = make_valid_root();
    write_report(
        &dir,
        "a.sql",
        "/*** IMPORTS\n- id: B\n  report: b.sql\n***/\nSELECT * FROM {{import B}};",
    );
    write_report(
        &dir,
        "b.sql",
        "/*** IMPORTS\n- id: A\n  report: a.sql\n***/\nSELECT * FROM {{import A}};",
    );
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let err = ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("a.sql"),
        &BTreeMap::new(),
        &BTreeMap::new(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ExecError::ImportCycle(_)));
}

#[test]
fn fixed_now_within_ttl_skips_recompute_but_past_ttl_forces_it() {
    let dir = make_valid_root();
    write_report(
        &dir,
        "cached.sql",
        "/*** CACHE\nttl_seconds: 60\n***/\nSELECT id FROM (VALUES (1), (2)) t(id);",
    );
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let result = ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("cached.sql"),
        &BTreeMap::new(),
        &BTreeMap::new(),
        None,
    )
    .unwrap();
    let write_time = fs::metadata(&result.base).unwrap().modified().unwrap();

    // Corrupt the artifact so any recompute is observable: a skipped
    // recompute leaves the corrupt bytes in place, a forced one overwrites
    // them with a fresh, readable parquet file.
    fs::write(&result.base, b"not a parquet file").unwrap();

    ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("cached.sql"),
        &BTreeMap::new(),
        &BTreeMap::new(),
        Some(write_time + Duration::from_secs(10)),
    )
    .unwrap();
    assert_eq!(fs::read(&result.base).unwrap(), b"not a parquet file");

    ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("cached.sql"),
        &BTreeMap::new(),
        &BTreeMap::new(),
        Some(write_time + Duration::from_secs(120)),
    )
    .unwrap();
    assert_eq!(read_ids(&conn, &result.base), vec![1, 2]);
}

#[test]
fn duplicate_case_insensitive_payload_keys_are_rejected() {
    let dir = make_valid_root();
    write_report(&dir, "widget.sql", WIDGET_REPORT);
    let layout = layout_for(&dir);
    let conn = Connection::open_in_memory().unwrap();

    let payload = BTreeMap::from([
        ("Widget".to_string(), Value::from(1)),
        ("widget".to_string(), Value::from(2)),
    ]);
    let err = ducksearch_exec::execute_report(
        &layout,
        &conn,
        Path::new("widget.sql"),
        &payload,
        &BTreeMap::new(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ExecError::DuplicateParamKey(_)));
}
