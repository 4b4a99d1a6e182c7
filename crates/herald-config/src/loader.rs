//! Config file loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the config file, if one is given and exists
//! 3. Apply env var fallbacks for fields the file did not set
//! 4. Deserialize merged tree → `Config`
//! 5. Validate

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{deep_merge, leaf_paths};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load configuration from defaults, an optional file, and the process
/// environment.
///
/// A `path` that does not exist is skipped, not an error.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is malformed, an env var holds an
/// unusable value, or the merged configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<Config> {
    load_with_env(path, &collect_env_vars())
}

/// Like [`load`], with an explicit environment map.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env<S: BuildHasher>(
    path: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut merged = parse_defaults()?;
    let mut set_by_file = HashSet::new();

    if let Some(path) = path
        && let Some(overlay) = try_load_file(path)?
    {
        leaf_paths(&overlay, "", &mut set_by_file);
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
    }

    let env_count = apply_env_fallbacks(&mut merged, &set_by_file, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    finish(merged, "<merged config>")
}

/// Parse a TOML document over the embedded defaults, without env fallbacks.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the document is malformed or fails validation.
pub fn from_toml_str(content: &str) -> ConfigResult<Config> {
    let overlay: toml::Value = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: "<string>".to_owned(),
        source: e,
    })?;

    let mut merged = parse_defaults()?;
    deep_merge(&mut merged, &overlay);
    finish(merged, "<string>")
}

/// Load a config from a specific file path (no env fallbacks).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or
/// validated. A missing file is a [`ConfigError::ReadError`].
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = read_bounded(path)?;
    let overlay: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut merged = parse_defaults()?;
    deep_merge(&mut merged, &overlay);
    finish(merged, &path.display().to_string())
}

fn parse_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<embedded defaults>".to_owned(),
        source: e,
    })
}

fn finish(merged: toml::Value, origin: &str) -> ConfigResult<Config> {
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: origin.to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match read_bounded(path) {
        Ok(c) => c,
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => return Err(e),
    };

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Read a file in one call, then reject it if it exceeds the size limit.
fn read_bounded(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::types::SubscribePolicy;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = load_with_env(None, &HashMap::new()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let config =
            load_with_env(Some(Path::new("/nonexistent/herald.toml")), &HashMap::new()).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            "[logging]\nlevel = \"debug\"\n\n[channel]\nbubbles = true\ncancelable = true\n",
        );

        let config = load_with_env(Some(file.path()), &HashMap::new()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
        assert!(config.channel.bubbles);
        assert_eq!(config.channel.cancelable, Some(true));
    }

    #[test]
    fn test_env_fills_fields_file_left_unset() {
        let file = write_config("[logging]\nlevel = \"warn\"\n");
        let env = make_env(&[
            ("HERALD_LOG_LEVEL", "trace"),
            ("HERALD_LOG_FORMAT", "json"),
            ("HERALD_SUBSCRIBE_POLICY", "retain"),
        ]);

        let config = load_with_env(Some(file.path()), &env).unwrap();
        // File wins over env.
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.channel.subscribe_policy, SubscribePolicy::Retain);
    }

    #[test]
    fn test_env_value_failing_validation() {
        let env = make_env(&[("HERALD_LOG_LEVEL", "loud")]);
        let err = load_with_env(None, &env).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let file = write_config("[logging\nlevel = ");
        let err = load_with_env(Some(file.path()), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = from_toml_str("[channel]\nbubbles = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_unknown_policy_in_file_is_parse_error() {
        let err = from_toml_str("[channel]\nsubscribe_policy = \"ignore\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/herald.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_file_reads_channel_section() {
        let file = write_config("[channel]\nsubscribe_policy = \"reject\"\n");
        let config = load_file(file.path()).unwrap();
        assert_eq!(config.channel.subscribe_policy, SubscribePolicy::Reject);
    }

    #[test]
    fn test_oversized_file_rejected() {
        let padding = "#".repeat(usize::try_from(MAX_CONFIG_FILE_SIZE).unwrap().saturating_add(1));
        let file = write_config(&padding);
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("byte limit"));
    }
}
