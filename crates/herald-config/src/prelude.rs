//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_config::prelude::*;` to import all essential types.

pub use crate::{ChannelSection, Config, LoggingSection, SubscribePolicy};

pub use crate::{ConfigError, ConfigResult};
