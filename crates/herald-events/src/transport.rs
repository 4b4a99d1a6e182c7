//! The transport capability a channel registers listeners with and emits through.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::event::Event;

/// Callback invoked for every event delivered to a registration.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Registration handle for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new listener ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options applied when registering a listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Invoke during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Remove the listener after its first invocation.
    pub once: bool,
    /// The listener never cancels the event; `prevent_default` is ignored.
    pub passive: bool,
}

impl ListenerOptions {
    /// Default options: bubble phase, persistent, not passive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register for the capture phase.
    #[must_use]
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Remove after the first delivery.
    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Mark the listener passive.
    #[must_use]
    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }

    /// Options a matching removal must use.
    #[must_use]
    pub fn removal(&self) -> RemoveListenerOptions {
        RemoveListenerOptions {
            capture: self.capture,
        }
    }
}

/// Options applied when removing a listener.
///
/// A removal only matches a registration made with the same `capture` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveListenerOptions {
    /// Whether the registration being removed was a capture listener.
    pub capture: bool,
}

/// Listener registration and event emission for named channels.
///
/// Implementations deliver synchronously from `emit`, in their own order
/// (registration order for [`EventTarget`](crate::EventTarget)).
pub trait Transport: Send + Sync {
    /// Register `listener` for `channel`.
    fn add_listener(
        &self,
        channel: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId;

    /// Remove a registration. Returns `true` if one was found and removed.
    fn remove_listener(&self, channel: &str, id: ListenerId, options: RemoveListenerOptions)
    -> bool;

    /// Deliver `event` to listeners of `event.name()`.
    ///
    /// Returns `false` if a listener cancelled the event, `true` otherwise.
    fn emit(&self, event: &Event) -> bool;

    /// Optional name for debugging.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn add_listener(
        &self,
        channel: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId {
        (**self).add_listener(channel, listener, options)
    }

    fn remove_listener(
        &self,
        channel: &str,
        id: ListenerId,
        options: RemoveListenerOptions,
    ) -> bool {
        (**self).remove_listener(channel, id, options)
    }

    fn emit(&self, event: &Event) -> bool {
        (**self).emit(event)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
