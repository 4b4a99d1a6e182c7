//! Configuration struct definitions.
//!
//! Every section uses `#[serde(default)]` so a config file only needs to
//! name the fields it changes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level Herald configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging and tracing settings.
    pub logging: LoggingSection,
    /// Defaults applied to channels built with these settings.
    pub channel: ChannelSection,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["herald_channel=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelSection
// ---------------------------------------------------------------------------

/// Channel defaults: event flags and the repeated-subscribe policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    /// Whether emitted events bubble to parent targets.
    pub bubbles: bool,
    /// Whether emitted events are cancelable. Unset means not cancelable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelable: Option<bool>,
    /// What `subscribe` does when the channel already has a listener.
    pub subscribe_policy: SubscribePolicy,
}

/// Behaviour of `subscribe` on a channel that is already subscribed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribePolicy {
    /// Remove the existing registration first, then register the new one.
    #[default]
    Replace,
    /// Fail the call and keep the existing registration.
    Reject,
    /// Register the new listener and forget the old handle, leaving the
    /// old listener attached to the transport.
    Retain,
}

impl SubscribePolicy {
    /// All accepted spellings, in declaration order.
    pub const VARIANTS: [&'static str; 3] = ["replace", "reject", "retain"];

    /// The configuration spelling of this policy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Reject => "reject",
            Self::Retain => "retain",
        }
    }

    /// Parse a configuration spelling, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "replace" => Some(Self::Replace),
            "reject" => Some(Self::Reject),
            "retain" => Some(Self::Retain),
            _ => None,
        }
    }
}

impl fmt::Display for SubscribePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
        assert_eq!(config.channel, ChannelSection::default());
    }

    #[test]
    fn test_subscribe_policy_snake_case() {
        let section: ChannelSection = toml::from_str("subscribe_policy = \"reject\"").unwrap();
        assert_eq!(section.subscribe_policy, SubscribePolicy::Reject);

        let json = serde_json::to_string(&SubscribePolicy::Retain).unwrap();
        assert_eq!(json, "\"retain\"");
    }

    #[test]
    fn test_subscribe_policy_parse() {
        assert_eq!(SubscribePolicy::parse(" Replace "), Some(SubscribePolicy::Replace));
        assert_eq!(SubscribePolicy::parse("retain"), Some(SubscribePolicy::Retain));
        assert_eq!(SubscribePolicy::parse("drop"), None);
        for name in SubscribePolicy::VARIANTS {
            assert_eq!(SubscribePolicy::parse(name).map(SubscribePolicy::as_str), Some(name));
        }
    }

    #[test]
    fn test_cancelable_omitted_when_unset() {
        let rendered = toml::to_string(&ChannelSection::default()).unwrap();
        assert!(!rendered.contains("cancelable"));
        assert!(rendered.contains("subscribe_policy = \"replace\""));
    }
}
