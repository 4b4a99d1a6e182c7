//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_pipeline::prelude::*;` to import all essential types.

// Execution
pub use crate::{DispatchContext, Next, Pipeline};

// Middleware
pub use crate::{FnMiddleware, Middleware, MiddlewareFuture, middleware_fn};

// Errors
pub use crate::{BoxError, PipelineError, PipelineResult};
