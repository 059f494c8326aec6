//! Layered configuration: `config.toml` at the project root, overridable
//! by `DUCKSEARCH_*` environment variables — the same figment layering
//! `zen-config` uses for the teacher workspace's own settings.

use std::collections::BTreeMap;
use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// The project's `CONFIG` values: arbitrary string key/value pairs a
/// report can reference via `{{config KEY}}`. Values are resolved once at
/// startup and held for the lifetime of the process.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DucksearchConfig {
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

/// Load `config.toml` from `config_path`, layering `DUCKSEARCH_`-prefixed
/// environment variables over it.
///
/// # Errors
///
/// Returns a [`figment::Error`] if the file or an env override fails to
/// parse.
pub fn load_config(config_path: &Path) -> Result<DucksearchConfig, figment::Error> {
    Figment::new()
        .merge(Toml::file(config_path))
        .merge(Env::prefixed("DUCKSEARCH_"))
        .extract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_flat_string_values_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "BASE_PATH = \"/data/widgets\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.values.get("BASE_PATH"), Some(&"/data/widgets".to_string()));
    }
}
