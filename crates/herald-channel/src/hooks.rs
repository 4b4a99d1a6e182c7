//! Lifecycle callbacks and the typed patch used to change them.

use std::fmt;
use std::sync::Arc;

use herald_pipeline::DispatchContext;

use crate::schema::SchemaError;

/// Called with the schema error instead of failing `dispatch`.
pub type ValidationErrorHook = Arc<dyn Fn(&SchemaError) + Send + Sync>;

/// Called with the post-pipeline context just before emission.
pub type BeforeEmitHook<P> = Arc<dyn Fn(&DispatchContext<P>) + Send + Sync>;

/// Called on subscribe or unsubscribe.
pub type LifecycleHook = Arc<dyn Fn() + Send + Sync>;

/// Guard predicate; `false` suppresses emission.
pub type Guard<P> = Arc<dyn Fn(&P) -> bool + Send + Sync>;

/// Called with a payload the guard refused.
pub type RefusedHook<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Mutable callback state of a channel.
pub(crate) struct Hooks<P> {
    pub(crate) on_validation_error: Option<ValidationErrorHook>,
    pub(crate) on_before_emit: Option<BeforeEmitHook<P>>,
    pub(crate) on_subscribed: Option<LifecycleHook>,
    pub(crate) on_unsubscribed: Option<LifecycleHook>,
    pub(crate) guard: Option<Guard<P>>,
    pub(crate) on_refused: Option<RefusedHook<P>>,
}

impl<P> Default for Hooks<P> {
    fn default() -> Self {
        Self {
            on_validation_error: None,
            on_before_emit: None,
            on_subscribed: None,
            on_unsubscribed: None,
            guard: None,
            on_refused: None,
        }
    }
}

impl<P> Clone for Hooks<P> {
    fn clone(&self) -> Self {
        Self {
            on_validation_error: self.on_validation_error.clone(),
            on_before_emit: self.on_before_emit.clone(),
            on_subscribed: self.on_subscribed.clone(),
            on_unsubscribed: self.on_unsubscribed.clone(),
            guard: self.guard.clone(),
            on_refused: self.on_refused.clone(),
        }
    }
}

impl<P> Hooks<P> {
    /// Overwrite each callback the patch sets; leave the rest untouched.
    pub(crate) fn apply(&mut self, patch: ChannelPatch<P>) {
        let ChannelPatch {
            on_validation_error,
            on_before_emit,
            on_subscribed,
            on_unsubscribed,
        } = patch;

        if let Some(hook) = on_validation_error {
            self.on_validation_error = Some(hook);
        }
        if let Some(hook) = on_before_emit {
            self.on_before_emit = Some(hook);
        }
        if let Some(hook) = on_subscribed {
            self.on_subscribed = Some(hook);
        }
        if let Some(hook) = on_unsubscribed {
            self.on_unsubscribed = Some(hook);
        }
    }
}

impl<P> fmt::Debug for Hooks<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_validation_error", &self.on_validation_error.is_some())
            .field("on_before_emit", &self.on_before_emit.is_some())
            .field("on_subscribed", &self.on_subscribed.is_some())
            .field("on_unsubscribed", &self.on_unsubscribed.is_some())
            .field("guard", &self.guard.is_some())
            .field("on_refused", &self.on_refused.is_some())
            .finish()
    }
}

/// Partial update of a channel's lifecycle callbacks.
///
/// Fields left `None` keep their current value.
///
/// ```rust
/// use herald_channel::ChannelPatch;
///
/// let patch: ChannelPatch<String> = ChannelPatch::new()
///     .on_before_emit(|ctx| println!("emitting {}", ctx.payload));
/// assert!(!patch.is_empty());
/// ```
pub struct ChannelPatch<P> {
    /// Replacement validation callback.
    pub on_validation_error: Option<ValidationErrorHook>,
    /// Replacement before-emit callback.
    pub on_before_emit: Option<BeforeEmitHook<P>>,
    /// Replacement subscribe callback.
    pub on_subscribed: Option<LifecycleHook>,
    /// Replacement unsubscribe callback.
    pub on_unsubscribed: Option<LifecycleHook>,
}

impl<P> Default for ChannelPatch<P> {
    fn default() -> Self {
        Self {
            on_validation_error: None,
            on_before_emit: None,
            on_subscribed: None,
            on_unsubscribed: None,
        }
    }
}

impl<P> fmt::Debug for ChannelPatch<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelPatch")
            .field("on_validation_error", &self.on_validation_error.is_some())
            .field("on_before_emit", &self.on_before_emit.is_some())
            .field("on_subscribed", &self.on_subscribed.is_some())
            .field("on_unsubscribed", &self.on_unsubscribed.is_some())
            .finish()
    }
}

impl<P> ChannelPatch<P> {
    /// An empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation callback.
    #[must_use]
    pub fn on_validation_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&SchemaError) + Send + Sync + 'static,
    {
        self.on_validation_error = Some(Arc::new(f));
        self
    }

    /// Set the before-emit callback.
    #[must_use]
    pub fn on_before_emit<F>(mut self, f: F) -> Self
    where
        F: Fn(&DispatchContext<P>) + Send + Sync + 'static,
    {
        self.on_before_emit = Some(Arc::new(f));
        self
    }

    /// Set the subscribe callback.
    #[must_use]
    pub fn on_subscribed<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_subscribed = Some(Arc::new(f));
        self
    }

    /// Set the unsubscribe callback.
    #[must_use]
    pub fn on_unsubscribed<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_unsubscribed = Some(Arc::new(f));
        self
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_validation_error.is_none()
            && self.on_before_emit.is_none()
            && self.on_subscribed.is_none()
            && self.on_unsubscribed.is_none()
    }
}
