//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_events::prelude::*;` to import all essential types.

// Events
pub use crate::{Event, EventDetail, EventInit, EventPhase};

// Transport
pub use crate::{EventTarget, Listener, ListenerId, ListenerOptions, RemoveListenerOptions, Transport};
