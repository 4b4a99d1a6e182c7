//! Deep merge of TOML layers.

use std::collections::HashSet;

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Collect the dotted paths of every leaf value in `val`.
///
/// Arrays count as leaves, matching how [`deep_merge`] replaces them whole.
pub fn leaf_paths(val: &toml::Value, prefix: &str, paths: &mut HashSet<String>) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            leaf_paths(child, &path, paths);
        }
    } else if !prefix.is_empty() {
        paths.insert(prefix.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_scalars_and_keeps_siblings() {
        let mut base = parse("[logging]\nlevel = \"info\"\nformat = \"compact\"");
        deep_merge(&mut base, &parse("[logging]\nlevel = \"debug\""));

        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(base["logging"]["format"].as_str(), Some("compact"));
    }

    #[test]
    fn test_arrays_are_replaced_not_appended() {
        let mut base = parse("[logging]\ndirectives = [\"a=info\", \"b=info\"]");
        deep_merge(&mut base, &parse("[logging]\ndirectives = [\"c=debug\"]"));

        let directives = base["logging"]["directives"].as_array().unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].as_str(), Some("c=debug"));
    }

    #[test]
    fn test_new_tables_are_inserted() {
        let mut base = parse("[logging]\nlevel = \"info\"");
        deep_merge(&mut base, &parse("[channel]\nbubbles = true"));
        assert_eq!(base["channel"]["bubbles"].as_bool(), Some(true));
    }

    #[test]
    fn test_leaf_paths() {
        let val = parse("[logging]\nlevel = \"warn\"\ndirectives = []\n[channel]\nbubbles = true");
        let mut paths = HashSet::new();
        leaf_paths(&val, "", &mut paths);

        assert_eq!(paths.len(), 3);
        assert!(paths.contains("logging.level"));
        assert!(paths.contains("logging.directives"));
        assert!(paths.contains("channel.bubbles"));
    }
}
