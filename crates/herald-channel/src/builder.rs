//! Channel construction.

use std::fmt;
use std::sync::Arc;

use herald_config::{ChannelSection, SubscribePolicy};
use herald_events::{EventInit, Transport};
use herald_pipeline::DispatchContext;

use crate::channel::Channel;
use crate::hooks::Hooks;
use crate::schema::{Schema, SchemaError};

/// Builder for [`Channel`]. Created by [`Channel::builder`].
///
/// Nothing touches the transport until the built channel subscribes or
/// dispatches.
pub struct ChannelBuilder<S: Schema> {
    schema: S,
    name: String,
    target: Arc<dyn Transport>,
    hooks: Hooks<S::Payload>,
    policy: SubscribePolicy,
    event_init: EventInit,
}

impl<S: Schema> fmt::Debug for ChannelBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBuilder")
            .field("name", &self.name)
            .field("target", &self.target.name())
            .field("hooks", &self.hooks)
            .field("policy", &self.policy)
            .field("event_init", &self.event_init)
            .finish_non_exhaustive()
    }
}

impl<S: Schema> ChannelBuilder<S> {
    pub(crate) fn new(schema: S, name: String, target: Arc<dyn Transport>) -> Self {
        Self {
            schema,
            name,
            target,
            hooks: Hooks::default(),
            policy: SubscribePolicy::default(),
            event_init: EventInit::default(),
        }
    }

    /// Handle validation failures with `f` instead of failing `dispatch`.
    #[must_use]
    pub fn on_validation_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&SchemaError) + Send + Sync + 'static,
    {
        self.hooks.on_validation_error = Some(Arc::new(f));
        self
    }

    /// Run `f` after the pipeline and before emission.
    #[must_use]
    pub fn on_before_emit<F>(mut self, f: F) -> Self
    where
        F: Fn(&DispatchContext<S::Payload>) + Send + Sync + 'static,
    {
        self.hooks.on_before_emit = Some(Arc::new(f));
        self
    }

    /// Run `f` on every `subscribe`.
    #[must_use]
    pub fn on_subscribed<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_subscribed = Some(Arc::new(f));
        self
    }

    /// Run `f` whenever a subscription is removed.
    #[must_use]
    pub fn on_unsubscribed<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_unsubscribed = Some(Arc::new(f));
        self
    }

    /// Choose what `subscribe` does on an already subscribed channel.
    #[must_use]
    pub fn subscribe_policy(mut self, policy: SubscribePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Event flags used by [`Channel::dispatch_default`].
    #[must_use]
    pub fn event_init(mut self, init: EventInit) -> Self {
        self.event_init = init;
        self
    }

    /// Apply a configuration section: event flags and subscribe policy.
    #[must_use]
    pub fn settings(mut self, section: &ChannelSection) -> Self {
        self.event_init = EventInit {
            bubbles: section.bubbles,
            cancelable: section.cancelable,
        };
        self.policy = section.subscribe_policy;
        self
    }

    /// Build the channel.
    #[must_use]
    pub fn build(self) -> Channel<S> {
        Channel::assemble(
            self.schema,
            self.name,
            self.target,
            self.hooks,
            self.policy,
            self.event_init,
        )
    }
}
