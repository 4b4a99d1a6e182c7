//! Typed view of an event delivered to a channel subscriber.

use herald_events::Event;

/// An event whose detail is known to be the channel's payload type.
#[derive(Debug)]
pub struct ChannelEvent<'a, P> {
    event: &'a Event,
    detail: &'a P,
}

impl<P> Clone for ChannelEvent<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for ChannelEvent<'_, P> {}

impl<'a, P: 'static> ChannelEvent<'a, P> {
    /// View `event` as carrying a `P`, or `None` if its detail has another type.
    #[must_use]
    pub fn from_event(event: &'a Event) -> Option<Self> {
        event.detail::<P>().map(|detail| Self { event, detail })
    }

    /// The payload, as validated and transformed before emission.
    #[must_use]
    pub fn detail(&self) -> &'a P {
        self.detail
    }

    /// The underlying transport event.
    #[must_use]
    pub fn event(&self) -> &'a Event {
        self.event
    }

    /// Channel name the event was emitted on.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.event.name()
    }

    /// Cancel the event. Has no effect unless the event is cancelable.
    pub fn prevent_default(&self) {
        self.event.prevent_default();
    }

    /// Stop the event from reaching further targets.
    pub fn stop_propagation(&self) {
        self.event.stop_propagation();
    }
}
