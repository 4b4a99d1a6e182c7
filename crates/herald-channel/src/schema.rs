//! The validator capability channels delegate payload checks to.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One problem found while validating a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Dotted path to the offending field. Empty for the payload itself.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl SchemaIssue {
    /// Create an issue at `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Structured validation failure returned by a [`Schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaError {
    /// Every issue found, in the order the schema reported them.
    pub issues: Vec<SchemaIssue>,
}

impl SchemaError {
    /// Create an error from a list of issues.
    #[must_use]
    pub fn new(issues: Vec<SchemaIssue>) -> Self {
        Self { issues }
    }

    /// Create an error with a single issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![SchemaIssue::new(path, message)])
    }

    /// Append an issue.
    #[must_use]
    pub fn with_issue(mut self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.issues.push(SchemaIssue::new(path, message));
        self
    }

    /// The issues found.
    #[must_use]
    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    /// All issues as one line, `"path: message"` entries joined by `"; "`.
    #[must_use]
    pub fn message(&self) -> String {
        if self.issues.is_empty() {
            return "invalid payload".to_string();
        }
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for SchemaError {}

/// Validates payloads of one type.
///
/// Channels never look inside a [`SchemaError`] beyond its message; the
/// whole value is forwarded to the validation callback.
pub trait Schema: Send + Sync {
    /// The payload type this schema accepts.
    type Payload: Send + Sync + 'static;

    /// Check `payload`, returning every problem found.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing why the payload is invalid.
    fn validate(&self, payload: &Self::Payload) -> Result<(), SchemaError>;
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    type Payload = S::Payload;

    fn validate(&self, payload: &Self::Payload) -> Result<(), SchemaError> {
        (**self).validate(payload)
    }
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    type Payload = S::Payload;

    fn validate(&self, payload: &Self::Payload) -> Result<(), SchemaError> {
        (**self).validate(payload)
    }
}

/// Schema backed by a closure. See [`schema_fn`].
pub struct FnSchema<P, F> {
    f: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> fmt::Debug for FnSchema<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchema").finish_non_exhaustive()
    }
}

/// Build a schema from a validation closure.
///
/// ```rust
/// use herald_channel::{Schema, SchemaError, schema_fn};
///
/// let positive = schema_fn(|n: &i64| {
///     if *n > 0 {
///         Ok(())
///     } else {
///         Err(SchemaError::single("", "must be positive"))
///     }
/// });
/// assert!(positive.validate(&3).is_ok());
/// assert_eq!(positive.validate(&-1).unwrap_err().message(), "must be positive");
/// ```
pub fn schema_fn<P, F>(f: F) -> FnSchema<P, F>
where
    P: Send + Sync + 'static,
    F: Fn(&P) -> Result<(), SchemaError> + Send + Sync,
{
    FnSchema {
        f,
        _payload: PhantomData,
    }
}

impl<P, F> Schema for FnSchema<P, F>
where
    P: Send + Sync + 'static,
    F: Fn(&P) -> Result<(), SchemaError> + Send + Sync,
{
    type Payload = P;

    fn validate(&self, payload: &P) -> Result<(), SchemaError> {
        (self.f)(payload)
    }
}
