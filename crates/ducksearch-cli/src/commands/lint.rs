//! `ducksearch lint`: walk every `.sql` file under `reports/`, parse and
//! lint it, and report `{code, message}` for each failure (spec §6).

use std::path::Path;

use ducksearch_core::{DucksearchError, ErrorPayload};
use walkdir::WalkDir;

/// Lint every report under `reports_dir`. Returns `true` if every report
/// passed.
#[must_use]
pub fn run(reports_dir: &Path) -> bool {
    let mut all_ok = true;

    for entry in WalkDir::new(reports_dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }

        let relative = entry.path().strip_prefix(reports_dir).unwrap_or(entry.path());
        match std::fs::read_to_string(entry.path()) {
            Ok(source) => match ducksearch_parser::lint_report(&source) {
                Ok(_) => tracing::info!(report = %relative.display(), "ok"),
                Err(err) => {
                    all_ok = false;
                    let err: DucksearchError = err.into();
                    let payload = ErrorPayload::from(&err);
                    tracing::error!(
                        report = %relative.display(),
                        code = payload.code,
                        message = %payload.message,
                        "lint failed"
                    );
                }
            },
            Err(source) => {
                all_ok = false;
                tracing::error!(report = %relative.display(), error = %source, "failed to read report");
            }
        }
    }

    all_ok
}
