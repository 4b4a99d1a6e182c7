//! Unified prelude for Herald.
//!
//! A single import for the commonly used types of every Herald crate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use herald_prelude::*;
//!
//! // Now you have access to types from:
//! // - herald-events (Event, EventTarget, Transport)
//! // - herald-pipeline (Pipeline, Middleware, Next)
//! // - herald-channel (Channel, Schema, ChannelPatch)
//! // - herald-config (Config, ChannelSection)
//! // - herald-telemetry (LogConfig, setup_logging)
//! ```
//!
//! # Per-Crate Preludes
//!
//! If you only need types from specific crates, use their individual preludes:
//!
//! ```rust,ignore
//! use herald_channel::prelude::*;
//! use herald_events::prelude::*;
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use herald_prelude::*;
//!
//! # #[derive(Debug)]
//! # struct Ping(u32);
//! let config = Config::default();
//! let target = Arc::new(EventTarget::new("app"));
//! let channel = Channel::builder(schema_fn(|_: &Ping| Ok(())), "ping", target)
//!     .settings(&config.channel)
//!     .build();
//!
//! channel.use_fn(|ctx, next| Box::pin(async move { next.run(ctx).await }));
//! assert_eq!(channel.pipeline().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

// Re-export all crate preludes
pub use herald_channel::prelude::*;
pub use herald_config::prelude::*;
pub use herald_events::prelude::*;
pub use herald_pipeline::prelude::*;
pub use herald_telemetry::prelude::*;
