//! # ducksearch-parser
//!
//! Root layout validation (C1), report parsing, and the SQL linter (C2).
//!
//! [`root::validate_root`] turns a project directory into a [`RootLayout`]
//! ([`ducksearch_core::RootLayout`]). [`report::parse_report`] turns one
//! report file's text into a typed [`ducksearch_core::Report`]. [`lint`]
//! then fully validates that report: parameter cross-references, CTE
//! `applies_to` siblings, dependency cycles, the illegal-SQL-construct
//! filter, and `parquet_scan` path discipline.

pub mod error;
pub mod lint;
pub mod report;
pub mod root;
pub mod sql_scan;

pub use error::ParserError;
pub use report::parse_report;
pub use root::validate_root;

use ducksearch_core::Report;

/// Parse and fully lint a report's source text in one call: metadata
/// extraction, single-statement enforcement, cross-reference validation,
/// dependency-cycle detection, and the SQL-construct / `parquet_scan`
/// discipline checks.
///
/// # Errors
///
/// Returns the first [`ParserError`] encountered, in the order above.
pub fn lint_report(source: &str) -> Result<Report, ParserError> {
    let report = report::parse_report(source)?;
    lint::validate_sql_constructs(&report.sql)?;
    lint::validate_parquet_paths(&report.sql)?;
    lint::validate_cross_references(&report)?;
    lint::detect_dependency_cycles(&report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lints_a_minimal_valid_report() {
        let source = "/*** PARAMS\nwidget_id: Optional[int] (scope=data)\n***/\n\
SELECT * FROM widgets WHERE {{param widget_id}} IS NULL OR id = {{param widget_id}};";
        let report = lint_report(source).unwrap();
        assert_eq!(report.parameters.len(), 1);
    }

    #[test]
    fn rejects_reports_with_illegal_sql() {
        let err = lint_report("DROP TABLE widgets;").unwrap_err();
        assert!(matches!(err, ParserError::IllegalSql(_)));
    }
}
