//! Configuration file loading for sigil.
//!
//! Reads `sigil.config.json` from the current working directory.

use serde::{Deserialize, Serialize};
use sigil_atelier::PreprocessOptions;
use std::path::Path;
use tracing::warn;

pub const CONFIG_FILE: &str = "sigil.config.json";

/// Top-level sigil configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SigilConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Preprocessor options.
    #[serde(default)]
    pub preprocess: PreprocessOptions,
}

/// Load `sigil.config.json` from the given directory (or CWD if None).
///
/// Unreadable or malformed files are reported and replaced by the defaults.
pub fn load_config(dir: Option<&Path>) -> SigilConfig {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config_path = base.join(CONFIG_FILE);

    if !config_path.exists() {
        return SigilConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to parse {}: {}", config_path.display(), e);
                SigilConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}", config_path.display(), e);
            SigilConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_atelier::MixedUseWarnings;
    use sigil_carton::Hasher;

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path()));
        assert!(config.schema.is_none());
        assert_eq!(config.preprocess.mixed_use_warnings, MixedUseWarnings::Use);
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
  "$schema": "./schema.json",
  "preprocess": { "hash": "xxh3", "mixedUseWarnings": true, "increaseSpecificity": true }
}"#,
        )
        .unwrap();
        let config = load_config(Some(dir.path()));
        assert_eq!(config.schema.as_deref(), Some("./schema.json"));
        assert!(matches!(config.preprocess.hash, Hasher::Xxh3));
        assert_eq!(config.preprocess.mixed_use_warnings, MixedUseWarnings::All);
        assert!(config.preprocess.increase_specificity);
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "preprocess": { "mixedUseWarnings": "sometimes" } }"#,
        )
        .unwrap();
        let config = load_config(Some(dir.path()));
        assert_eq!(config.preprocess.mixed_use_warnings, MixedUseWarnings::Use);
    }
}
