//! C5: cache key derivation and TTL-based freshness (spec §5).
//!
//! A report's cache key is its path relative to `reports/`, extension
//! stripped, `/` replaced with `__`. Every cache file this pipeline writes
//! is named from that key, so two reports can never collide and a single
//! report's own artifacts are trivially enumerable by prefix.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ducksearch_core::RootLayout;

use crate::error::ExecError;

/// Default freshness window when a report's `CACHE.ttl_seconds` is unset.
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Derive the cache key for `report_path` (absolute or already relative to
/// `reports_dir`).
///
/// # Errors
///
/// Returns [`ExecError::ExecutionFailed`] if `report_path` isn't under
/// `reports_dir`.
pub fn cache_key_for(reports_dir: &Path, report_path: &Path) -> Result<String, ExecError> {
    let relative = if report_path.is_absolute() {
        report_path.strip_prefix(reports_dir).map_err(|_| {
            ExecError::ExecutionFailed(format!(
                "report path {} is not under reports dir {}",
                report_path.display(),
                reports_dir.display()
            ))
        })?
    } else {
        report_path
    };

    let without_extension = relative.with_extension("");
    let key = without_extension
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("__");

    Ok(key)
}

/// Whether the cache file at `path` is within `ttl_seconds` of `now`. A
/// missing file is never fresh; a file whose mtime is (clock-skew) in the
/// future is treated as fresh rather than erroring.
///
/// `now` is the monotonic timestamp to measure against; pass `None` to use
/// the real wall clock (`SystemTime::now()`). Tests pass a fixed `now` to
/// exercise TTL transitions deterministically without sleeping.
#[must_use]
pub fn is_fresh(path: &Path, ttl_seconds: u64, now: Option<SystemTime>) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    let now = now.unwrap_or_else(SystemTime::now);
    match now.duration_since(modified) {
        Ok(age) => age.as_secs() <= ttl_seconds,
        Err(_) => true,
    }
}

#[must_use]
pub fn artifact_path(layout: &RootLayout, key: &str) -> PathBuf {
    layout.artifacts_dir().join(format!("{key}.parquet"))
}

#[must_use]
pub fn materialize_path(layout: &RootLayout, key: &str, cte_name: &str) -> PathBuf {
    layout.materialize_dir().join(format!("{key}__{cte_name}.parquet"))
}

#[must_use]
pub fn literal_source_path(layout: &RootLayout, key: &str, id: &str) -> PathBuf {
    layout.literal_sources_dir().join(format!("{key}__{id}.parquet"))
}

#[must_use]
pub fn bindings_path(layout: &RootLayout, key: &str, id: &str) -> PathBuf {
    layout.bindings_dir().join(format!("{key}__{id}.parquet"))
}
