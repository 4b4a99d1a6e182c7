//! Herald Events - In-process event transport for Herald channels.
//!
//! This crate provides:
//! - [`Event`] values carrying a type-erased detail
//! - The [`Transport`] capability channels register listeners with
//! - [`EventTarget`], an in-process transport with capture and bubble phases
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use herald_events::{Event, EventInit, EventTarget, ListenerOptions, Transport};
//!
//! let target = EventTarget::new("app");
//! target.add_listener(
//!     "user_created",
//!     Arc::new(|event: &Event| {
//!         assert_eq!(event.detail::<String>().map(String::as_str), Some("ada"));
//!     }),
//!     ListenerOptions::new(),
//! );
//!
//! let delivered = target.emit(&Event::new("user_created", "ada".to_string(), EventInit::new()));
//! assert!(delivered);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod event;
mod target;
mod transport;

pub use event::{Event, EventDetail, EventInit, EventPhase};
pub use target::EventTarget;
pub use transport::{Listener, ListenerId, ListenerOptions, RemoveListenerOptions, Transport};
