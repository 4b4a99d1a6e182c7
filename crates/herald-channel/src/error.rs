//! Channel error types.

use herald_pipeline::PipelineError;
use thiserror::Error;

use crate::schema::SchemaError;

/// Errors returned by channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The payload failed schema validation and no validation callback is set.
    #[error("Validation failed on channel '{channel}': {message}")]
    Validation {
        /// Channel the payload was dispatched on.
        channel: String,
        /// The schema's error message.
        message: String,
        /// The structured schema error.
        #[source]
        source: SchemaError,
    },

    /// The middleware pipeline failed; nothing was emitted.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// `subscribe` was called on a subscribed channel with the reject policy.
    #[error("Channel '{channel}' already has an active subscription")]
    AlreadySubscribed {
        /// Channel name.
        channel: String,
    },
}

impl ChannelError {
    /// The schema error, if this is a validation failure.
    #[must_use]
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            Self::Validation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The pipeline error, if the middleware chain failed.
    #[must_use]
    pub fn pipeline_error(&self) -> Option<&PipelineError> {
        match self {
            Self::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
