//! The channel controller: validate, guard, run middleware, emit.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, RwLock};

use herald_config::SubscribePolicy;
use herald_events::{
    Event, EventInit, Listener, ListenerId, ListenerOptions, RemoveListenerOptions, Transport,
};
use herald_pipeline::{DispatchContext, Middleware, MiddlewareFuture, Next, Pipeline};
use tracing::{Instrument, debug, debug_span, trace, warn};

use crate::builder::ChannelBuilder;
use crate::error::{ChannelError, ChannelResult};
use crate::event::ChannelEvent;
use crate::hooks::{ChannelPatch, Hooks, RefusedHook};
use crate::schema::{Schema, SchemaError};

/// Which path a [`Channel::dispatch`] call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event was emitted through the transport.
    Emitted {
        /// `false` if a listener cancelled the event.
        not_cancelled: bool,
    },
    /// Validation failed and the validation callback handled it.
    Rejected,
    /// The guard predicate refused the payload.
    Refused,
}

impl DispatchOutcome {
    /// Whether an event reached the transport.
    #[must_use]
    pub fn is_emitted(self) -> bool {
        matches!(self, Self::Emitted { .. })
    }
}

/// Active listener registration.
#[derive(Debug, Clone, Copy)]
struct Subscription {
    id: ListenerId,
    options: ListenerOptions,
}

/// Registration bookkeeping, shared with `once` listeners.
#[derive(Debug, Default)]
struct Slot {
    active: Option<Subscription>,
    /// Held by a `Reject` subscribe between its check and its commit.
    reserved: bool,
}

fn lock_slot<'a>(slot: &'a Mutex<Slot>, channel: &str) -> MutexGuard<'a, Slot> {
    slot.lock().unwrap_or_else(|e| {
        warn!(channel = %channel, "Subscription lock poisoned, recovering");
        e.into_inner()
    })
}

/// Exclusive claim on an empty slot under [`SubscribePolicy::Reject`].
///
/// Released on drop unless committed, so a panicking `on_subscribed`
/// callback does not leave the channel unsubscribable.
struct Reservation<'a> {
    slot: &'a Mutex<Slot>,
    channel: &'a str,
    armed: bool,
}

impl Reservation<'_> {
    fn commit(mut self, subscription: Subscription) -> Option<Subscription> {
        let mut slot = lock_slot(self.slot, self.channel);
        slot.reserved = false;
        self.armed = false;
        slot.active.replace(subscription)
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock_slot(self.slot, self.channel).reserved = false;
        }
    }
}

/// Clears the channel's handle after a `once` listener has been consumed.
///
/// The transport drops a `once` registration before invoking it, which may
/// happen before `subscribe` has stored the handle; whichever of
/// [`fired`](Self::fired) and [`registered`](Self::registered) runs last
/// does the clearing.
struct OnceRelease {
    slot: Arc<Mutex<Slot>>,
    channel: String,
    id: OnceLock<ListenerId>,
    fired: AtomicBool,
}

impl OnceRelease {
    fn fired(&self) {
        self.fired.store(true, Ordering::SeqCst);
        self.clear();
    }

    fn registered(&self, id: ListenerId) {
        let _ = self.id.set(id);
        if self.fired.load(Ordering::SeqCst) {
            self.clear();
        }
    }

    fn clear(&self) {
        let Some(id) = self.id.get().copied() else {
            return;
        };
        let mut slot = lock_slot(&self.slot, &self.channel);
        // A newer registration may already own the slot.
        if slot.active.is_some_and(|s| s.id == id) {
            slot.active = None;
            debug!(channel = %self.channel, listener_id = %id, "Once listener consumed");
        }
    }
}

/// A named, schema-validated event channel on a transport.
///
/// Every [`dispatch`](Self::dispatch) validates the payload, checks the
/// guard set by [`refine`](Self::refine), runs the middleware pipeline,
/// calls the before-emit hook and emits one event whose detail is the
/// resulting payload. A channel holds at most one listener registration.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use herald_channel::{Channel, SchemaError, schema_fn};
/// use herald_events::{EventTarget, ListenerOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let schema = schema_fn(|name: &String| {
///     if name.is_empty() {
///         Err(SchemaError::single("name", "must not be empty"))
///     } else {
///         Ok(())
///     }
/// });
/// let channel = Channel::new(schema, "greet", Arc::new(EventTarget::new("app")));
///
/// channel
///     .subscribe(|event| println!("hello, {}", event.detail()), ListenerOptions::new())
///     .unwrap();
/// assert!(channel.dispatch_default("ada".to_string()).await.unwrap().is_emitted());
/// assert!(channel.dispatch_default(String::new()).await.is_err());
/// # }
/// ```
pub struct Channel<S: Schema> {
    name: String,
    target: Arc<dyn Transport>,
    schema: S,
    pipeline: Pipeline<S::Payload>,
    hooks: RwLock<Hooks<S::Payload>>,
    subscription: Arc<Mutex<Slot>>,
    policy: SubscribePolicy,
    event_init: EventInit,
}

impl<S: Schema> fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("target", &self.target.name())
            .field("pipeline", &self.pipeline)
            .field("subscribed", &self.is_subscribed())
            .field("policy", &self.policy)
            .field("event_init", &self.event_init)
            .finish_non_exhaustive()
    }
}

impl<S: Schema> Channel<S> {
    /// Start building a channel named `name` that registers and emits on
    /// `target`.
    pub fn builder(
        schema: S,
        name: impl Into<String>,
        target: Arc<dyn Transport>,
    ) -> ChannelBuilder<S> {
        ChannelBuilder::new(schema, name.into(), target)
    }

    /// Create a channel with no callbacks and default settings.
    pub fn new(schema: S, name: impl Into<String>, target: Arc<dyn Transport>) -> Self {
        Self::builder(schema, name, target).build()
    }

    pub(crate) fn assemble(
        schema: S,
        name: String,
        target: Arc<dyn Transport>,
        hooks: Hooks<S::Payload>,
        policy: SubscribePolicy,
        event_init: EventInit,
    ) -> Self {
        debug!(channel = %name, target = %target.name(), %policy, "Channel created");
        Self {
            name,
            target,
            schema,
            pipeline: Pipeline::new(),
            hooks: RwLock::new(hooks),
            subscription: Arc::new(Mutex::new(Slot::default())),
            policy,
            event_init,
        }
    }

    /// Channel name; also the name of every emitted event.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The transport this channel registers and emits on.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn Transport> {
        &self.target
    }

    /// The payload schema.
    #[must_use]
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// The owned middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<S::Payload> {
        &self.pipeline
    }

    /// Policy applied when subscribing while already subscribed.
    #[must_use]
    pub fn subscribe_policy(&self) -> SubscribePolicy {
        self.policy
    }

    /// Event flags used by [`dispatch_default`](Self::dispatch_default).
    #[must_use]
    pub fn event_init(&self) -> EventInit {
        self.event_init
    }

    /// Whether a listener registration is active.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.lock_subscription().active.is_some()
    }

    /// Handle of the active registration, if any.
    #[must_use]
    pub fn listener_id(&self) -> Option<ListenerId> {
        self.lock_subscription().active.map(|s| s.id)
    }

    fn lock_subscription(&self) -> MutexGuard<'_, Slot> {
        lock_slot(&self.subscription, &self.name)
    }

    /// Snapshot of the callbacks, taken so none run under the lock.
    fn hooks(&self) -> Hooks<S::Payload> {
        self.hooks
            .read()
            .unwrap_or_else(|e| {
                warn!(channel = %self.name, "Hooks lock poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }

    fn with_hooks_mut(&self, f: impl FnOnce(&mut Hooks<S::Payload>)) {
        let mut hooks = self.hooks.write().unwrap_or_else(|e| {
            warn!(channel = %self.name, "Hooks lock poisoned, recovering");
            e.into_inner()
        });
        f(&mut hooks);
    }

    /// Register `listener` for this channel's events on the target.
    ///
    /// The listener only sees events whose detail is the payload type;
    /// other events with the same name are skipped. The `on_subscribed`
    /// callback runs once per successful call, before registration.
    ///
    /// A `once` registration stops counting as active as soon as the
    /// transport consumes it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::AlreadySubscribed`] if the policy is
    /// [`SubscribePolicy::Reject`] and a registration is active or another
    /// `subscribe` call on this channel is still in progress, including one
    /// made from the `on_subscribed` callback.
    pub fn subscribe<F>(&self, listener: F, options: ListenerOptions) -> ChannelResult<ListenerId>
    where
        F: Fn(&ChannelEvent<'_, S::Payload>) + Send + Sync + 'static,
    {
        let mut reservation = None;
        let replaced = {
            let mut slot = self.lock_subscription();
            match self.policy {
                SubscribePolicy::Replace => slot.active.take(),
                SubscribePolicy::Reject => {
                    if slot.active.is_some() || slot.reserved {
                        debug!(
                            channel = %self.name,
                            listener_id = ?slot.active.map(|s| s.id),
                            "Subscribe rejected, channel already subscribed"
                        );
                        return Err(ChannelError::AlreadySubscribed {
                            channel: self.name.clone(),
                        });
                    }
                    slot.reserved = true;
                    reservation = Some(Reservation {
                        slot: self.subscription.as_ref(),
                        channel: &self.name,
                        armed: true,
                    });
                    None
                },
                SubscribePolicy::Retain => {
                    if let Some(existing) = slot.active {
                        warn!(
                            channel = %self.name,
                            listener_id = %existing.id,
                            "Previous listener stays registered without a handle"
                        );
                    }
                    None
                },
            }
        };
        if let Some(replaced) = replaced {
            self.detach(replaced, replaced.options.removal());
        }

        if let Some(hook) = self.hooks().on_subscribed {
            hook();
        }

        let release = options.once.then(|| {
            Arc::new(OnceRelease {
                slot: Arc::clone(&self.subscription),
                channel: self.name.clone(),
                id: OnceLock::new(),
                fired: AtomicBool::new(false),
            })
        });
        let channel = self.name.clone();
        let consumed = release.clone();
        let wrapped: Listener = Arc::new(move |event: &Event| {
            if let Some(consumed) = &consumed {
                consumed.fired();
            }
            if let Some(view) = ChannelEvent::from_event(event) {
                listener(&view);
            } else {
                trace!(
                    channel = %channel,
                    event_id = %event.event_id(),
                    "Skipping event with a different detail type"
                );
            }
        });
        let id = self.target.add_listener(&self.name, wrapped, options);

        let subscription = Subscription { id, options };
        let displaced = match reservation {
            Some(reservation) => reservation.commit(subscription),
            None => self.lock_subscription().active.replace(subscription),
        };
        if let Some(release) = release {
            release.registered(id);
        }
        if let Some(displaced) = displaced
            && self.policy == SubscribePolicy::Replace
        {
            // A concurrent subscribe registered in between; keep only ours.
            self.detach(displaced, displaced.options.removal());
        }

        debug!(channel = %self.name, listener_id = %id, "Subscribed");
        Ok(id)
    }

    /// Remove the active registration.
    ///
    /// Does nothing, and makes no transport call, when not subscribed or
    /// when a `once` registration was already consumed. Otherwise the handle
    /// is cleared and `on_unsubscribed` runs. Returns whether the transport
    /// found and removed the registration; it will not if `options.capture`
    /// differs from the one used to subscribe.
    pub fn unsubscribe(&self, options: RemoveListenerOptions) -> bool {
        let active = self.lock_subscription().active.take();
        let Some(subscription) = active else {
            trace!(channel = %self.name, "Unsubscribe with no active subscription");
            return false;
        };
        self.detach(subscription, options)
    }

    fn detach(&self, subscription: Subscription, options: RemoveListenerOptions) -> bool {
        let removed = self
            .target
            .remove_listener(&self.name, subscription.id, options);
        if !removed {
            debug!(
                channel = %self.name,
                listener_id = %subscription.id,
                "Transport had no matching registration"
            );
        }

        if let Some(hook) = self.hooks().on_unsubscribed {
            hook();
        }

        debug!(channel = %self.name, listener_id = %subscription.id, "Unsubscribed");
        removed
    }

    /// Validate, guard, process and emit `payload`.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::Validation`] if the payload is invalid and no
    ///   validation callback is set.
    /// - [`ChannelError::Pipeline`] if a middleware fails or calls its
    ///   continuation twice.
    ///
    /// Nothing is emitted on any error path.
    pub async fn dispatch(
        &self,
        payload: S::Payload,
        init: EventInit,
    ) -> ChannelResult<DispatchOutcome> {
        let ctx = DispatchContext::new(self.name.as_str(), payload);
        let span = debug_span!(
            "dispatch",
            channel = %self.name,
            dispatch_id = %ctx.dispatch_id
        );
        self.run(ctx, init).instrument(span).await
    }

    /// [`dispatch`](Self::dispatch) with the channel's configured event flags.
    ///
    /// # Errors
    ///
    /// Same as [`dispatch`](Self::dispatch).
    pub async fn dispatch_default(&self, payload: S::Payload) -> ChannelResult<DispatchOutcome> {
        self.dispatch(payload, self.event_init).await
    }

    async fn run(
        &self,
        mut ctx: DispatchContext<S::Payload>,
        init: EventInit,
    ) -> ChannelResult<DispatchOutcome> {
        if let Err(error) = self.schema.validate(&ctx.payload) {
            return self.reject(error);
        }

        {
            let hooks = self.hooks();
            if let Some(guard) = hooks.guard
                && !guard(&ctx.payload)
            {
                debug!("Payload refused by guard");
                if let Some(on_refused) = hooks.on_refused {
                    on_refused(&ctx.payload);
                }
                return Ok(DispatchOutcome::Refused);
            }
        }

        self.pipeline
            .execute(&mut ctx)
            .await
            .inspect_err(|e| debug!(error = %e, "Pipeline failed, nothing emitted"))?;

        if let Some(hook) = self.hooks().on_before_emit {
            hook(&ctx);
        }

        let event = Event::new(self.name.as_str(), ctx.into_payload(), init);
        let not_cancelled = self.target.emit(&event);
        trace!(
            event_id = %event.event_id(),
            bubbles = init.bubbles,
            not_cancelled,
            "Event emitted"
        );

        Ok(DispatchOutcome::Emitted { not_cancelled })
    }

    fn reject(&self, error: SchemaError) -> ChannelResult<DispatchOutcome> {
        if let Some(hook) = self.hooks().on_validation_error {
            debug!(
                issues = error.issues().len(),
                "Payload failed validation, handled by callback"
            );
            hook(&error);
            return Ok(DispatchOutcome::Rejected);
        }

        warn!(error = %error, "Payload failed validation");
        Err(ChannelError::Validation {
            channel: self.name.clone(),
            message: error.message(),
            source: error,
        })
    }

    /// Install a guard. Payloads for which `predicate` returns `false` are
    /// not emitted; `on_refused` is called with them instead.
    ///
    /// Replaces any previous guard and refusal callback together.
    pub fn refine<F>(&self, predicate: F, on_refused: Option<RefusedHook<S::Payload>>)
    where
        F: Fn(&S::Payload) -> bool + Send + Sync + 'static,
    {
        self.with_hooks_mut(|hooks| {
            hooks.guard = Some(Arc::new(predicate));
            hooks.on_refused = on_refused;
        });
        debug!(channel = %self.name, "Guard installed");
    }

    /// [`refine`](Self::refine) with a closure as the refusal callback.
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use herald_channel::{Channel, schema_fn};
    /// # use herald_events::EventTarget;
    /// let channel = Channel::new(schema_fn(|_: &u32| Ok(())), "count", Arc::new(EventTarget::new("app")));
    /// channel.refine_with(|n| n % 2 == 0, |n| println!("odd count {n} dropped"));
    /// ```
    pub fn refine_with<F, R>(&self, predicate: F, on_refused: R)
    where
        F: Fn(&S::Payload) -> bool + Send + Sync + 'static,
        R: Fn(&S::Payload) + Send + Sync + 'static,
    {
        self.refine(predicate, Some(Arc::new(on_refused)));
    }

    /// Remove the guard and its refusal callback.
    pub fn clear_refinement(&self) {
        self.with_hooks_mut(|hooks| {
            hooks.guard = None;
            hooks.on_refused = None;
        });
    }

    /// Replace the callbacks `patch` sets; leave the others as they are.
    pub fn update(&self, patch: ChannelPatch<S::Payload>) {
        if patch.is_empty() {
            return;
        }
        self.with_hooks_mut(|hooks| hooks.apply(patch));
        debug!(channel = %self.name, "Callbacks updated");
    }

    /// Append a middleware to the pipeline.
    pub fn use_middleware<M>(&self, middleware: M)
    where
        M: Middleware<S::Payload> + 'static,
    {
        self.pipeline.push(middleware);
    }

    /// Append a closure middleware to the pipeline.
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use herald_channel::{Channel, schema_fn};
    /// # use herald_events::EventTarget;
    /// let channel = Channel::new(schema_fn(|_: &u32| Ok(())), "count", Arc::new(EventTarget::new("app")));
    /// channel.use_fn(|ctx, next| {
    ///     Box::pin(async move {
    ///         ctx.payload = ctx.payload.saturating_mul(2);
    ///         next.run(ctx).await
    ///     })
    /// });
    /// assert_eq!(channel.pipeline().len(), 1);
    /// ```
    pub fn use_fn<F>(&self, f: F)
    where
        F: for<'a> Fn(&'a mut DispatchContext<S::Payload>, Next<'a, S::Payload>) -> MiddlewareFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.pipeline.push_fn(f);
    }
}
