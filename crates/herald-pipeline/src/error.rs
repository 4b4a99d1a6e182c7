//! Pipeline error types.

use thiserror::Error;

/// Boxed error produced by user middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while executing a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A continuation was invoked for a position the chain already advanced to.
    ///
    /// Signals a defect in middleware, not a runtime condition.
    #[error("next() called multiple times (continuation to position {position})")]
    NextCalledMultipleTimes {
        /// Chain position the rejected continuation tried to advance to.
        position: usize,
    },

    /// A middleware failed. The original error is kept as the source.
    #[error("{0}")]
    Middleware(#[source] BoxError),
}

impl PipelineError {
    /// Wrap a middleware failure.
    pub fn middleware(err: impl Into<BoxError>) -> Self {
        Self::Middleware(err.into())
    }

    /// Check if this is a continuation protocol violation.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::NextCalledMultipleTimes { .. })
    }

    /// Downcast a middleware failure to its concrete error type.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Middleware(err) => err.downcast_ref::<E>(),
            Self::NextCalledMultipleTimes { .. } => None,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn test_middleware_error_keeps_message_and_type() {
        let err = PipelineError::middleware(QuotaExceeded);
        assert_eq!(err.to_string(), "quota exceeded");
        assert!(err.downcast_ref::<QuotaExceeded>().is_some());
        assert!(!err.is_protocol_violation());
    }

    #[test]
    fn test_middleware_error_from_str() {
        let err = PipelineError::middleware("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_protocol_violation_message() {
        let err = PipelineError::NextCalledMultipleTimes { position: 1 };
        assert!(err.is_protocol_violation());
        assert!(err.to_string().starts_with("next() called multiple times"));
    }
}
