//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields that
//! no config file set. Embedded defaults do not count as set.

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::SubscribePolicy;

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `HERALD_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "HERALD_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "HERALD_LOG_FORMAT",
        field_path: "logging.format",
    },
    EnvMapping {
        var_name: "HERALD_EVENT_BUBBLES",
        field_path: "channel.bubbles",
    },
    EnvMapping {
        var_name: "HERALD_SUBSCRIBE_POLICY",
        field_path: "channel.subscribe_policy",
    },
];

/// Apply environment variable fallbacks to fields not in `set_by_file`.
///
/// Returns the number of env vars applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable holds a value that cannot
/// be converted to its field's type.
pub fn apply_env_fallbacks<S: BuildHasher, T: BuildHasher>(
    merged: &mut toml::Value,
    set_by_file: &HashSet<String, T>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if set_by_file.contains(mapping.field_path) {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            let value = coerce_to_toml_value(mapping, val)?;
            set_field(merged, mapping.field_path, value);
            count = count.saturating_add(1);
        }
    }

    Ok(count)
}

/// Convert a raw env value to the TOML type of its field.
fn coerce_to_toml_value(mapping: &EnvMapping, val: &str) -> ConfigResult<toml::Value> {
    match mapping.field_path {
        "channel.bubbles" => val
            .trim()
            .parse::<bool>()
            .map(toml::Value::Boolean)
            .map_err(|_| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected 'true' or 'false', got '{val}'"),
            }),
        "channel.subscribe_policy" => SubscribePolicy::parse(val)
            .map(|policy| toml::Value::String(policy.as_str().to_owned()))
            .ok_or_else(|| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!(
                    "unknown subscribe policy '{val}'; expected one of: {}",
                    SubscribePolicy::VARIANTS.join(", ")
                ),
            }),
        _ => Ok(toml::Value::String(val.trim().to_owned())),
    }
}

/// Set a dotted field in the TOML tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_fallbacks() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"").unwrap();
        let env = make_env(&[("HERALD_LOG_LEVEL", "debug"), ("HERALD_EVENT_BUBBLES", "true")]);

        let count = apply_env_fallbacks(&mut merged, &HashSet::new(), &env).unwrap();

        assert_eq!(count, 2);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["channel"]["bubbles"].as_bool(), Some(true));
    }

    #[test]
    fn test_env_fallback_skips_fields_set_by_file() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let set_by_file: HashSet<String> = ["logging.level".to_owned()].into_iter().collect();
        let env = make_env(&[("HERALD_LOG_LEVEL", "debug")]);

        let count = apply_env_fallbacks(&mut merged, &set_by_file, &env).unwrap();

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_invalid_bool_is_env_error() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let env = make_env(&[("HERALD_EVENT_BUBBLES", "sometimes")]);

        let err = apply_env_fallbacks(&mut merged, &HashSet::new(), &env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvError { ref var_name, .. } if var_name == "HERALD_EVENT_BUBBLES"
        ));
    }

    #[test]
    fn test_subscribe_policy_is_normalized() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let env = make_env(&[("HERALD_SUBSCRIBE_POLICY", "Reject")]);

        apply_env_fallbacks(&mut merged, &HashSet::new(), &env).unwrap();
        assert_eq!(merged["channel"]["subscribe_policy"].as_str(), Some("reject"));
    }

    #[test]
    fn test_unknown_subscribe_policy_is_env_error() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let env = make_env(&[("HERALD_SUBSCRIBE_POLICY", "ignore")]);

        let err = apply_env_fallbacks(&mut merged, &HashSet::new(), &env).unwrap_err();
        assert!(err.to_string().contains("unknown subscribe policy 'ignore'"));
    }
}
