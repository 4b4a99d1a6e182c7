//! Herald Test - Shared test utilities for Herald crates.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! herald-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use herald_channel::Channel;
//! use herald_test::{Collector, RecordingTransport, value_schema, ValuePayload};
//!
//! #[tokio::test]
//! async fn test_dispatch() {
//!     let transport = Arc::new(RecordingTransport::new());
//!     let channel = Channel::new(value_schema(), "value", transport.clone());
//!     let seen = Collector::new();
//!     channel.subscribe(seen.listener(), Default::default()).unwrap();
//!
//!     channel.dispatch_default(ValuePayload::new(1)).await.unwrap();
//!     assert_eq!(seen.items(), vec![ValuePayload::new(1)]);
//!     assert_eq!(transport.emit_calls(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
