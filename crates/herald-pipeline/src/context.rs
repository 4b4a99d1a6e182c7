//! Per-dispatch context threaded through the pipeline.

use uuid::Uuid;

/// Mutable carrier for one dispatch.
///
/// Middleware may rewrite `payload` in place; the channel emits whatever
/// value it holds once the pipeline completes.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchContext<P> {
    /// The validated payload.
    pub payload: P,
    /// Name of the channel being dispatched on.
    pub channel: String,
    /// Unique identifier for this dispatch.
    pub dispatch_id: Uuid,
}

impl<P> DispatchContext<P> {
    /// Create a context for a new dispatch.
    #[must_use]
    pub fn new(channel: impl Into<String>, payload: P) -> Self {
        Self {
            payload,
            channel: channel.into(),
            dispatch_id: Uuid::new_v4(),
        }
    }

    /// Consume the context, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> P {
        self.payload
    }
}
