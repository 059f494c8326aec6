//! The response envelope shape shared by the CLI's JSON output mode and the
//! HTTP server collaborator (spec §6): `{ok, cache_root, base_parquet,
//! materialize, literal_sources, bindings}` on success, `{ok:false, error:
//! {code, message}}` otherwise.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DucksearchError;
use crate::types::ExecutionResult;

/// The `{code, message}` error half of the envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl From<&DucksearchError> for ErrorPayload {
    fn from(error: &DucksearchError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.message(),
        }
    }
}

/// The full response envelope returned to HTTP/CLI callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Success {
        ok: bool,
        cache_root: String,
        base_parquet: String,
        materialize: BTreeMap<String, String>,
        literal_sources: BTreeMap<String, String>,
        bindings: BTreeMap<String, String>,
    },
    Failure {
        ok: bool,
        error: ErrorPayload,
    },
}

impl Envelope {
    /// Build a success envelope, rendering every path in `result` relative
    /// to `root` (the envelope is strictly relative to the supplied root,
    /// per spec §3's `ExecutionResult` contract).
    #[must_use]
    pub fn success(result: &ExecutionResult, root: &Path) -> Self {
        let rel = |p: &Path| -> String {
            p.strip_prefix(root)
                .unwrap_or(p)
                .to_string_lossy()
                .into_owned()
        };

        Self::Success {
            ok: true,
            cache_root: root.to_string_lossy().into_owned(),
            base_parquet: rel(&result.base),
            materialize: result
                .materialized
                .iter()
                .map(|(k, v)| (k.clone(), rel(v)))
                .collect(),
            literal_sources: result
                .literal_sources
                .iter()
                .map(|(k, v)| (k.clone(), rel(v)))
                .collect(),
            bindings: result
                .bindings
                .iter()
                .map(|(k, v)| (k.clone(), rel(v)))
                .collect(),
        }
    }

    #[must_use]
    pub fn failure(error: &DucksearchError) -> Self {
        Self::Failure {
            ok: false,
            error: error.into(),
        }
    }
}
