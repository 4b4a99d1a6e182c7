//! In-process event target with DOM-style propagation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};

use crate::event::{Event, EventPhase};
use crate::transport::{Listener, ListenerId, ListenerOptions, RemoveListenerOptions, Transport};

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    listener: Listener,
    options: ListenerOptions,
    removed: Arc<AtomicBool>,
}

impl Registration {
    fn runs_in(&self, phase: EventPhase) -> bool {
        match phase {
            EventPhase::Capturing => self.options.capture,
            EventPhase::Bubbling => !self.options.capture,
            EventPhase::AtTarget => true,
            EventPhase::None => false,
        }
    }
}

/// A node that hosts listeners for named channels.
///
/// Targets may have a parent. Events emitted on a target visit capture
/// listeners on its ancestors first (root downwards), then every listener on
/// the target, then, if the event bubbles, non-capture listeners on the
/// ancestors (upwards).
///
/// Listeners run without any internal lock held, so they may register,
/// deregister, or emit re-entrantly.
pub struct EventTarget {
    name: String,
    parent: Option<Arc<EventTarget>>,
    listeners: RwLock<HashMap<String, Vec<Registration>>>,
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("listener_count", &self.len())
            .finish()
    }
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new("root")
    }
}

impl EventTarget {
    /// Create a root target.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Create a target nested under `parent`.
    #[must_use]
    pub fn with_parent(name: impl Into<String>, parent: Arc<EventTarget>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Target name.
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.name
    }

    /// Parent target, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<EventTarget>> {
        self.parent.as_ref()
    }

    /// Number of listeners registered for `channel` on this target.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.read().get(channel).map_or(0, Vec::len)
    }

    /// Total number of listeners on this target.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    /// Check if no listeners are registered on this target.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().values().all(Vec::is_empty)
    }

    /// Remove every listener on this target.
    pub fn clear(&self) {
        let drained: Vec<Registration> = {
            let mut map = self.write();
            map.drain().flat_map(|(_, regs)| regs).collect()
        };
        for reg in &drained {
            reg.removed.store(true, Ordering::SeqCst);
        }
        debug!(target_name = %self.name, cleared = drained.len(), "All listeners cleared");
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Registration>>> {
        self.listeners.read().unwrap_or_else(|e| {
            warn!(target_name = %self.name, "EventTarget read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Registration>>> {
        self.listeners.write().unwrap_or_else(|e| {
            warn!(target_name = %self.name, "EventTarget lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Detach a registration. The removed value is dropped after the lock is
    /// released, so a listener whose drop re-enters the target cannot deadlock.
    fn detach(&self, channel: &str, id: ListenerId, capture: Option<bool>) -> Option<Registration> {
        let mut map = self.write();
        let regs = map.get_mut(channel)?;
        let pos = regs
            .iter()
            .position(|r| r.id == id && capture.is_none_or(|c| r.options.capture == c))?;
        let reg = regs.remove(pos);
        if regs.is_empty() {
            map.remove(channel);
        }
        reg.removed.store(true, Ordering::SeqCst);
        Some(reg)
    }

    fn snapshot(&self, channel: &str, phase: EventPhase) -> Vec<Registration> {
        let mut regs: Vec<Registration> = self
            .read()
            .get(channel)
            .map(|regs| regs.iter().filter(|r| r.runs_in(phase)).cloned().collect())
            .unwrap_or_default();
        if phase == EventPhase::AtTarget {
            // Capture registrations fire first at the target; the sort is stable.
            regs.sort_by_key(|r| !r.options.capture);
        }
        regs
    }

    fn invoke(&self, event: &Event, phase: EventPhase) {
        event.set_phase(phase);
        for reg in self.snapshot(event.name(), phase) {
            if event.immediate_stopped() {
                break;
            }
            if reg.removed.load(Ordering::SeqCst) {
                continue;
            }
            if reg.options.once {
                drop(self.detach(event.name(), reg.id, None));
            }

            trace!(
                target_name = %self.name,
                channel = %event.name(),
                listener_id = %reg.id,
                phase = ?phase,
                "Delivering event"
            );

            event.set_passive(reg.options.passive);
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                (reg.listener)(event);
            }));
            event.set_passive(false);

            if let Err(e) = result {
                warn!(
                    target_name = %self.name,
                    channel = %event.name(),
                    listener_id = %reg.id,
                    error = ?e,
                    "Listener panicked"
                );
            }
        }
    }
}

impl Transport for EventTarget {
    fn add_listener(
        &self,
        channel: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId {
        let id = ListenerId::new();
        self.write()
            .entry(channel.to_string())
            .or_default()
            .push(Registration {
                id,
                listener,
                options,
                removed: Arc::new(AtomicBool::new(false)),
            });

        debug!(
            target_name = %self.name,
            channel = %channel,
            listener_id = %id,
            capture = options.capture,
            once = options.once,
            "Listener registered"
        );
        id
    }

    fn remove_listener(
        &self,
        channel: &str,
        id: ListenerId,
        options: RemoveListenerOptions,
    ) -> bool {
        let removed = self.detach(channel, id, Some(options.capture)).is_some();
        if removed {
            debug!(
                target_name = %self.name,
                channel = %channel,
                listener_id = %id,
                "Listener removed"
            );
        }
        removed
    }

    fn emit(&self, event: &Event) -> bool {
        let mut ancestors: Vec<&EventTarget> = Vec::new();
        let mut current = self.parent.as_deref();
        while let Some(node) = current {
            ancestors.push(node);
            current = node.parent.as_deref();
        }

        trace!(
            target_name = %self.name,
            channel = %event.name(),
            event_id = %event.event_id(),
            depth = ancestors.len(),
            "Emitting event"
        );

        for node in ancestors.iter().rev() {
            node.invoke(event, EventPhase::Capturing);
            if event.propagation_stopped() {
                event.set_phase(EventPhase::None);
                return !event.default_prevented();
            }
        }

        self.invoke(event, EventPhase::AtTarget);

        if event.bubbles() && !event.propagation_stopped() {
            for node in &ancestors {
                node.invoke(event, EventPhase::Bubbling);
                if event.propagation_stopped() {
                    break;
                }
            }
        }

        event.set_phase(EventPhase::None);
        !event.default_prevented()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventInit;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, label: &str) -> Listener {
        let log = Arc::clone(log);
        let label = label.to_string();
        Arc::new(move |_event: &Event| {
            log.lock().unwrap().push(label.clone());
        })
    }

    fn counter(count: &Arc<AtomicUsize>) -> Listener {
        let count = Arc::clone(count);
        Arc::new(move |_event: &Event| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let target = EventTarget::new("root");
        let log = Arc::new(Mutex::new(Vec::new()));

        target.add_listener("ping", recorder(&log, "a"), ListenerOptions::new());
        target.add_listener("ping", recorder(&log, "b"), ListenerOptions::new());
        target.add_listener("other", recorder(&log, "x"), ListenerOptions::new());

        assert!(target.emit(&Event::new("ping", (), EventInit::new())));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(target.listener_count("ping"), 2);
        assert_eq!(target.len(), 3);
    }

    #[test]
    fn test_remove_listener() {
        let target = EventTarget::new("root");
        let count = Arc::new(AtomicUsize::new(0));
        let id = target.add_listener("ping", counter(&count), ListenerOptions::new());

        assert!(target.remove_listener("ping", id, RemoveListenerOptions::default()));
        assert!(!target.remove_listener("ping", id, RemoveListenerOptions::default()));
        assert!(target.is_empty());

        target.emit(&Event::new("ping", (), EventInit::new()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove_requires_matching_capture_flag() {
        let target = EventTarget::new("root");
        let count = Arc::new(AtomicUsize::new(0));
        let id = target.add_listener("ping", counter(&count), ListenerOptions::new().capture());

        assert!(!target.remove_listener("ping", id, RemoveListenerOptions { capture: false }));
        assert_eq!(target.listener_count("ping"), 1);
        assert!(target.remove_listener("ping", id, RemoveListenerOptions { capture: true }));
    }

    #[test]
    fn test_once_listener_fires_once() {
        let target = EventTarget::new("root");
        let count = Arc::new(AtomicUsize::new(0));
        target.add_listener("ping", counter(&count), ListenerOptions::new().once());

        target.emit(&Event::new("ping", (), EventInit::new()));
        target.emit(&Event::new("ping", (), EventInit::new()));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(target.is_empty());
    }

    #[test]
    fn test_bubbling_reaches_parent_only_when_enabled() {
        let root = Arc::new(EventTarget::new("root"));
        let child = EventTarget::with_parent("child", Arc::clone(&root));
        let log = Arc::new(Mutex::new(Vec::new()));

        root.add_listener("ping", recorder(&log, "root"), ListenerOptions::new());
        child.add_listener("ping", recorder(&log, "child"), ListenerOptions::new());

        child.emit(&Event::new("ping", (), EventInit::new()));
        assert_eq!(*log.lock().unwrap(), vec!["child"]);

        log.lock().unwrap().clear();
        child.emit(&Event::new("ping", (), EventInit::new().with_bubbles(true)));
        assert_eq!(*log.lock().unwrap(), vec!["child", "root"]);
    }

    #[test]
    fn test_capture_on_ancestor_runs_first() {
        let root = Arc::new(EventTarget::new("root"));
        let child = EventTarget::with_parent("child", Arc::clone(&root));
        let log = Arc::new(Mutex::new(Vec::new()));

        child.add_listener("ping", recorder(&log, "child"), ListenerOptions::new());
        root.add_listener("ping", recorder(&log, "root-capture"), ListenerOptions::new().capture());

        child.emit(&Event::new("ping", (), EventInit::new()));
        assert_eq!(*log.lock().unwrap(), vec!["root-capture", "child"]);
    }

    #[test]
    fn test_capture_listeners_first_at_target() {
        let target = EventTarget::new("root");
        let log = Arc::new(Mutex::new(Vec::new()));

        target.add_listener("ping", recorder(&log, "bubble"), ListenerOptions::new());
        target.add_listener("ping", recorder(&log, "capture"), ListenerOptions::new().capture());

        target.emit(&Event::new("ping", (), EventInit::new()));
        assert_eq!(*log.lock().unwrap(), vec!["capture", "bubble"]);
    }

    #[test]
    fn test_stop_propagation_blocks_bubbling() {
        let root = Arc::new(EventTarget::new("root"));
        let child = EventTarget::with_parent("child", Arc::clone(&root));
        let count = Arc::new(AtomicUsize::new(0));

        root.add_listener("ping", counter(&count), ListenerOptions::new());
        child.add_listener(
            "ping",
            Arc::new(|event: &Event| event.stop_propagation()),
            ListenerOptions::new(),
        );
        child.add_listener("ping", counter(&count), ListenerOptions::new());

        child.emit(&Event::new("ping", (), EventInit::new().with_bubbles(true)));
        // The second child listener still runs; the root listener does not.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_immediate_propagation_skips_remaining_listeners() {
        let target = EventTarget::new("root");
        let count = Arc::new(AtomicUsize::new(0));

        target.add_listener(
            "ping",
            Arc::new(|event: &Event| event.stop_immediate_propagation()),
            ListenerOptions::new(),
        );
        target.add_listener("ping", counter(&count), ListenerOptions::new());

        target.emit(&Event::new("ping", (), EventInit::new()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancel_reported_by_emit() {
        let target = EventTarget::new("root");
        target.add_listener(
            "ping",
            Arc::new(|event: &Event| event.prevent_default()),
            ListenerOptions::new(),
        );

        assert!(target.emit(&Event::new("ping", (), EventInit::new())));
        assert!(!target.emit(&Event::new("ping", (), EventInit::new().with_cancelable(true))));
    }

    #[test]
    fn test_passive_listener_cannot_cancel() {
        let target = EventTarget::new("root");
        target.add_listener(
            "ping",
            Arc::new(|event: &Event| event.prevent_default()),
            ListenerOptions::new().passive(),
        );

        assert!(target.emit(&Event::new("ping", (), EventInit::new().with_cancelable(true))));
    }

    #[test]
    fn test_panicking_listener_does_not_stop_delivery() {
        let target = EventTarget::new("root");
        let count = Arc::new(AtomicUsize::new(0));

        target.add_listener(
            "ping",
            Arc::new(|_event: &Event| panic!("listener failure")),
            ListenerOptions::new(),
        );
        target.add_listener("ping", counter(&count), ListenerOptions::new());

        target.emit(&Event::new("ping", (), EventInit::new()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reentrant_remove_skips_unreached_listener() {
        let target = Arc::new(EventTarget::new("root"));
        let count = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let target_clone = Arc::clone(&target);
        let victim_clone = Arc::clone(&victim);
        target.add_listener(
            "ping",
            Arc::new(move |_event: &Event| {
                if let Some(id) = *victim_clone.lock().unwrap() {
                    target_clone.remove_listener("ping", id, RemoveListenerOptions::default());
                }
            }),
            ListenerOptions::new(),
        );
        let id = target.add_listener("ping", counter(&count), ListenerOptions::new());
        *victim.lock().unwrap() = Some(id);

        target.emit(&Event::new("ping", (), EventInit::new()));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(target.listener_count("ping"), 1);
    }

    #[test]
    fn test_detail_visible_to_listener() {
        let target = EventTarget::new("root");
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        target.add_listener(
            "ping",
            Arc::new(move |event: &Event| {
                *seen_clone.lock().unwrap() = event.detail::<u32>().copied();
            }),
            ListenerOptions::new(),
        );

        target.emit(&Event::new("ping", 42_u32, EventInit::new()));
        assert_eq!(*seen.lock().unwrap(), Some(42));
    }

    #[test]
    fn test_clear() {
        let target = EventTarget::new("root");
        let count = Arc::new(AtomicUsize::new(0));
        target.add_listener("a", counter(&count), ListenerOptions::new());
        target.add_listener("b", counter(&count), ListenerOptions::new());

        target.clear();
        assert!(target.is_empty());
        target.emit(&Event::new("a", (), EventInit::new()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
