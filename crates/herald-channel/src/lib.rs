//! Herald Channel - Schema-validated event channels.
//!
//! A [`Channel`] wraps one named event on a [`Transport`](herald_events::Transport).
//! Each dispatch runs:
//!
//! 1. schema validation ([`Schema`])
//! 2. the optional guard set with [`Channel::refine`]
//! 3. the middleware [`Pipeline`](herald_pipeline::Pipeline)
//! 4. the before-emit callback
//! 5. emission through the transport
//!
//! Validation failures either reach the validation callback or fail the
//! dispatch with [`ChannelError::Validation`]. Middleware failures always
//! fail the dispatch. Nothing is emitted on a failed or refused dispatch.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod builder;
mod channel;
mod error;
mod event;
mod hooks;
mod schema;

pub use builder::ChannelBuilder;
pub use channel::{Channel, DispatchOutcome};
pub use error::{ChannelError, ChannelResult};
pub use event::ChannelEvent;
pub use hooks::{
    BeforeEmitHook, ChannelPatch, Guard, LifecycleHook, RefusedHook, ValidationErrorHook,
};
pub use schema::{FnSchema, Schema, SchemaError, SchemaIssue, schema_fn};

pub use herald_config::SubscribePolicy;
