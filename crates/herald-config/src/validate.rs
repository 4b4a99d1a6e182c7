//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Accepted values for `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted values for `logging.format`.
pub const LOG_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_logging(config)?;
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    if let Some(index) = config
        .logging
        .directives
        .iter()
        .position(|d| d.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: format!("logging.directives[{index}]"),
            message: "directive must not be empty".to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_unknown_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();

        let err = validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "logging.level"
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();

        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("unsupported log format 'xml'"));
    }

    #[test]
    fn test_empty_directive_rejected() {
        let mut config = Config::default();
        config.logging.directives = vec!["herald_channel=debug".to_owned(), "  ".to_owned()];

        let err = validate(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "logging.directives[1]"
        ));
    }
}
