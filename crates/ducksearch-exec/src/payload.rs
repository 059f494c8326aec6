//! Request-payload folding and parameter scope routing (spec §3, §8).
//!
//! A caller may submit a bare key (`Widget`) or a `__client__`-prefixed
//! twin (`__client__Widget`) for a `hybrid`-scope parameter. The bare key
//! is the only one that ever reaches server-side filtering — the
//! `__client__` twin exists purely so a UI can echo back the value it's
//! displaying without forcing a server re-filter. Two bare keys that
//! differ only by case are rejected outright: there is no well-defined
//! precedence between `Widget` and `widget`.

use std::collections::BTreeMap;

use ducksearch_core::{Parameter, ParameterScope};
use serde_json::Value;

use crate::error::ExecError;

pub const CLIENT_ONLY_PREFIX: &str = "__client__";

/// Validate a raw request payload: reject duplicate bare keys that only
/// differ by ASCII case.
///
/// # Errors
///
/// Returns [`ExecError::DuplicateParamKey`] naming the colliding keys.
pub fn fold_payload(raw: &BTreeMap<String, Value>) -> Result<BTreeMap<String, Value>, ExecError> {
    let mut seen_lower: BTreeMap<String, String> = BTreeMap::new();
    for key in raw.keys() {
        if key.starts_with(CLIENT_ONLY_PREFIX) {
            continue;
        }
        let lower = key.to_ascii_lowercase();
        if let Some(previous) = seen_lower.insert(lower, key.clone()) {
            return Err(ExecError::DuplicateParamKey(format!("{previous} / {key}")));
        }
    }
    Ok(raw.clone())
}

/// The value a parameter should be filtered by server-side, per its scope:
/// `view` never routes to the server, `data` always reads its bare key,
/// `hybrid` reads its bare key if present and is otherwise treated as
/// absent — a `__client__`-prefixed twin is never consulted here.
#[must_use]
pub fn resolve_param_value<'a>(
    payload: &'a BTreeMap<String, Value>,
    parameter: &Parameter,
) -> Option<&'a Value> {
    match parameter.scope {
        ParameterScope::View => None,
        ParameterScope::Data | ParameterScope::Hybrid => payload.get(&parameter.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducksearch_core::{AppliesTo, AppliesToMode, ParameterType, PrimitiveType};

    fn hybrid_param(name: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            param_type: ParameterType::Primitive(PrimitiveType::Int),
            scope: ParameterScope::Hybrid,
            applies_to: Some(AppliesTo { cte: "widgets".into(), mode: AppliesToMode::Wrapper }),
        }
    }

    #[test]
    fn rejects_duplicate_bare_keys_case_insensitively() {
        let payload = BTreeMap::from([
            ("Widget".to_string(), Value::from(1)),
            ("widget".to_string(), Value::from(2)),
        ]);
        let err = fold_payload(&payload).unwrap_err();
        assert!(matches!(err, ExecError::DuplicateParamKey(_)));
    }

    #[test]
    fn allows_client_only_twin_alongside_differently_cased_bare_key() {
        let payload = BTreeMap::from([
            ("Widget".to_string(), Value::from(1)),
            ("__client__Widget".to_string(), Value::from(1)),
        ]);
        assert!(fold_payload(&payload).is_ok());
    }

    #[test]
    fn hybrid_param_ignores_client_only_twin_when_bare_key_absent() {
        let payload = BTreeMap::from([("__client__Widget".to_string(), Value::from(9))]);
        let parameter = hybrid_param("Widget");
        assert_eq!(resolve_param_value(&payload, &parameter), None);
    }

    #[test]
    fn hybrid_param_uses_bare_key_when_present() {
        let payload = BTreeMap::from([("Widget".to_string(), Value::from(9))]);
        let parameter = hybrid_param("Widget");
        assert_eq!(resolve_param_value(&payload, &parameter), Some(&Value::from(9)));
    }
}
