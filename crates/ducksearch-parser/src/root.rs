//! C1: Root Validator.
//!
//! Asserts the on-disk project layout (`config.toml`, `reports/`,
//! `composites/`, `cache/<nine subdirs>/`) and produces a [`RootLayout`].
//! Never mutates the filesystem; collects every missing entry into a single
//! error rather than short-circuiting on the first one (spec §4.1, §8).

use std::path::{Path, PathBuf};

use ducksearch_core::RootLayout;

use crate::error::ParserError;

/// Validate `root` against the expected ducksearch project layout.
///
/// # Errors
///
/// Returns [`ParserError::PathMissing`] naming every missing or
/// wrong-kind path if the layout is incomplete.
pub fn validate_root(root: &Path) -> Result<RootLayout, ParserError> {
    let layout = RootLayout::new(root.to_path_buf());
    let mut missing: Vec<PathBuf> = Vec::new();

    check_exists(&layout.config_file, true, &mut missing);
    check_exists(&layout.reports_dir, false, &mut missing);
    check_exists(&layout.composites_dir, false, &mut missing);
    check_exists(&layout.cache_dir, false, &mut missing);

    for subdir in layout.all_cache_subdirs() {
        check_exists(subdir, false, &mut missing);
    }

    if missing.is_empty() {
        tracing::debug!(root = %layout.root.display(), "root layout validated");
        Ok(layout)
    } else {
        let joined = missing
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ParserError::PathMissing(format!(
            "missing required paths: {joined}"
        )))
    }
}

fn check_exists(path: &Path, must_be_file: bool, missing: &mut Vec<PathBuf>) {
    let ok = if must_be_file {
        path.is_file()
    } else {
        path.is_dir()
    };
    if !ok {
        missing.push(path.to_path_buf());
    }
}
