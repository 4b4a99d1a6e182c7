//! Mock implementations for testing.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use herald_channel::ChannelEvent;
use herald_events::{
    Event, EventDetail, EventTarget, Listener, ListenerId, ListenerOptions, RemoveListenerOptions,
    Transport,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// One event seen by a [`RecordingTransport`].
#[derive(Clone)]
pub struct RecordedEvent {
    /// Event name.
    pub name: String,
    /// The type-erased detail.
    pub detail: EventDetail,
    /// Whether the event was emitted with bubbling.
    pub bubbles: bool,
    /// Whether the event was cancelable.
    pub cancelable: bool,
    /// What `emit` returned.
    pub not_cancelled: bool,
}

impl RecordedEvent {
    /// Downcast the detail.
    #[must_use]
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.downcast_ref::<T>()
    }
}

impl fmt::Debug for RecordedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedEvent")
            .field("name", &self.name)
            .field("bubbles", &self.bubbles)
            .field("cancelable", &self.cancelable)
            .field("not_cancelled", &self.not_cancelled)
            .finish_non_exhaustive()
    }
}

/// Transport that delivers through an [`EventTarget`] and records every call.
///
/// Share it as `Arc<RecordingTransport>`; the channel gets one clone and the
/// test keeps another for assertions.
pub struct RecordingTransport {
    target: Arc<EventTarget>,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    emit_calls: AtomicUsize,
    events: Mutex<Vec<RecordedEvent>>,
}

impl fmt::Debug for RecordingTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingTransport")
            .field("target", &self.target)
            .field("add_calls", &self.add_calls())
            .field("remove_calls", &self.remove_calls())
            .field("emit_calls", &self.emit_calls())
            .finish_non_exhaustive()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTransport {
    /// Create a recording transport over a fresh target named `"test"`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_target(Arc::new(EventTarget::new("test")))
    }

    /// Record calls made against an existing target.
    #[must_use]
    pub fn with_target(target: Arc<EventTarget>) -> Self {
        Self {
            target,
            add_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            emit_calls: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    /// The wrapped target.
    #[must_use]
    pub fn target(&self) -> &Arc<EventTarget> {
        &self.target
    }

    /// Number of `add_listener` calls.
    #[must_use]
    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Number of `remove_listener` calls.
    #[must_use]
    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    /// Number of `emit` calls.
    #[must_use]
    pub fn emit_calls(&self) -> usize {
        self.emit_calls.load(Ordering::SeqCst)
    }

    /// Every emitted event, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        lock(&self.events).clone()
    }

    /// Emitted details of type `T`, in emission order.
    #[must_use]
    pub fn details<T: Any + Clone>(&self) -> Vec<T> {
        lock(&self.events)
            .iter()
            .filter_map(|e| e.detail::<T>().cloned())
            .collect()
    }

    /// Number of listeners currently registered for `channel`.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.target.listener_count(channel)
    }
}

impl Transport for RecordingTransport {
    fn add_listener(
        &self,
        channel: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.target.add_listener(channel, listener, options)
    }

    fn remove_listener(
        &self,
        channel: &str,
        id: ListenerId,
        options: RemoveListenerOptions,
    ) -> bool {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.target.remove_listener(channel, id, options)
    }

    fn emit(&self, event: &Event) -> bool {
        self.emit_calls.fetch_add(1, Ordering::SeqCst);
        let not_cancelled = self.target.emit(event);
        lock(&self.events).push(RecordedEvent {
            name: event.name().to_string(),
            detail: Arc::clone(event.raw_detail()),
            bubbles: event.bubbles(),
            cancelable: event.cancelable(),
            not_cancelled,
        });
        not_cancelled
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Collects the payloads a channel listener receives.
#[derive(Debug)]
pub struct Collector<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Collector<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for Collector<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Collector<T> {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel listener that appends each delivered detail.
    pub fn listener(&self) -> impl Fn(&ChannelEvent<'_, T>) + Send + Sync + 'static {
        let items = Arc::clone(&self.items);
        move |event| lock(&items).push(event.detail().clone())
    }

    /// A plain callback that appends its argument.
    pub fn sink(&self) -> impl Fn(&T) + Send + Sync + 'static {
        let items = Arc::clone(&self.items);
        move |item| lock(&items).push(item.clone())
    }

    /// Everything collected so far.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        lock(&self.items).clone()
    }

    /// Number of items collected.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Check if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}

/// Counts how often a callback ran.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A no-argument callback that increments the counter.
    pub fn hook(&self) -> impl Fn() + Send + Sync + 'static {
        let calls = Arc::clone(&self.calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A one-argument callback that increments the counter.
    pub fn hook_with<A: ?Sized + 'static>(&self) -> impl Fn(&A) + Send + Sync + 'static {
        let calls = Arc::clone(&self.calls);
        move |_: &A| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Calls so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
