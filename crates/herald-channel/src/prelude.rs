//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_channel::prelude::*;` to import all essential types.

// Channel
pub use crate::{Channel, ChannelBuilder, ChannelEvent, ChannelPatch, DispatchOutcome, SubscribePolicy};

// Schema
pub use crate::{Schema, SchemaError, SchemaIssue, schema_fn};

// Errors
pub use crate::{ChannelError, ChannelResult};
