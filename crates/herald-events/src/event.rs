//! Event values delivered through a transport.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Type-erased event detail.
pub type EventDetail = Arc<dyn Any + Send + Sync>;

/// Initialization flags for an emitted event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInit {
    /// Whether the event propagates to ancestor targets after the target itself.
    pub bubbles: bool,
    /// Whether listeners may cancel the event. `None` means not cancelable.
    pub cancelable: Option<bool>,
}

impl EventInit {
    /// Create init flags with bubbling and cancellation disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bubbling flag.
    #[must_use]
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set the cancelable flag.
    #[must_use]
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = Some(cancelable);
        self
    }
}

/// Propagation phase an event is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// Not being dispatched.
    None,
    /// Travelling from the root towards the target.
    Capturing,
    /// Delivered to listeners on the target itself.
    AtTarget,
    /// Travelling from the target back towards the root.
    Bubbling,
}

impl EventPhase {
    fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Capturing => 1,
            Self::AtTarget => 2,
            Self::Bubbling => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Capturing,
            2 => Self::AtTarget,
            3 => Self::Bubbling,
            _ => Self::None,
        }
    }
}

/// A named event carrying an arbitrary detail value.
///
/// Flags are atomics so listeners can cancel or stop propagation through a
/// shared reference while the transport keeps iterating.
pub struct Event {
    name: String,
    detail: EventDetail,
    bubbles: bool,
    cancelable: bool,
    event_id: Uuid,
    timestamp: DateTime<Utc>,
    phase: AtomicU8,
    default_prevented: AtomicBool,
    propagation_stopped: AtomicBool,
    immediate_stopped: AtomicBool,
    in_passive_listener: AtomicBool,
}

impl Event {
    /// Create a new event with the given name, detail, and init flags.
    pub fn new<T>(name: impl Into<String>, detail: T, init: EventInit) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::from_detail(name, Arc::new(detail), init)
    }

    /// Create a new event from an already type-erased detail.
    #[must_use]
    pub fn from_detail(name: impl Into<String>, detail: EventDetail, init: EventInit) -> Self {
        Self {
            name: name.into(),
            detail,
            bubbles: init.bubbles,
            cancelable: init.cancelable.unwrap_or(false),
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            phase: AtomicU8::new(EventPhase::None.as_u8()),
            default_prevented: AtomicBool::new(false),
            propagation_stopped: AtomicBool::new(false),
            immediate_stopped: AtomicBool::new(false),
            in_passive_listener: AtomicBool::new(false),
        }
    }

    /// Event (channel) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Downcast the detail to a concrete type.
    #[must_use]
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.downcast_ref::<T>()
    }

    /// The raw, type-erased detail.
    #[must_use]
    pub fn raw_detail(&self) -> &EventDetail {
        &self.detail
    }

    /// Whether the event bubbles.
    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event can be cancelled.
    #[must_use]
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Unique identifier of this event instance.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// When the event was created.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Current propagation phase.
    #[must_use]
    pub fn phase(&self) -> EventPhase {
        EventPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Cancel the event.
    ///
    /// Ignored when the event is not cancelable or when called from a
    /// listener registered as passive.
    pub fn prevent_default(&self) {
        if self.cancelable && !self.in_passive_listener.load(Ordering::SeqCst) {
            self.default_prevented.store(true, Ordering::SeqCst);
        }
    }

    /// Whether a listener cancelled the event.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }

    /// Stop propagation to further targets once the current target is done.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::SeqCst);
    }

    /// Stop propagation immediately, skipping the remaining listeners.
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::SeqCst);
        self.immediate_stopped.store(true, Ordering::SeqCst);
    }

    pub(crate) fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn immediate_stopped(&self) -> bool {
        self.immediate_stopped.load(Ordering::SeqCst)
    }

    pub(crate) fn set_phase(&self, phase: EventPhase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    pub(crate) fn set_passive(&self, passive: bool) {
        self.in_passive_listener.store(passive, Ordering::SeqCst);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("event_id", &self.event_id)
            .field("bubbles", &self.bubbles)
            .field("cancelable", &self.cancelable)
            .field("phase", &self.phase())
            .field("default_prevented", &self.default_prevented())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_init_defaults() {
        let init = EventInit::default();
        assert!(!init.bubbles);
        assert_eq!(init.cancelable, None);
    }

    #[test]
    fn test_detail_downcast() {
        let event = Event::new("greeting", String::from("hello"), EventInit::new());
        assert_eq!(event.detail::<String>().map(String::as_str), Some("hello"));
        assert!(event.detail::<u32>().is_none());
        assert_eq!(event.name(), "greeting");
        assert_eq!(event.phase(), EventPhase::None);
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let event = Event::new("e", 1_u8, EventInit::new());
        event.prevent_default();
        assert!(!event.default_prevented());

        let event = Event::new("e", 1_u8, EventInit::new().with_cancelable(true));
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn test_prevent_default_ignored_in_passive_listener() {
        let event = Event::new("e", 1_u8, EventInit::new().with_cancelable(true));
        event.set_passive(true);
        event.prevent_default();
        assert!(!event.default_prevented());
    }

    #[test]
    fn test_stop_immediate_implies_stop() {
        let event = Event::new("e", (), EventInit::new());
        event.stop_immediate_propagation();
        assert!(event.propagation_stopped());
        assert!(event.immediate_stopped());
    }
}
