//! Middleware trait and closure adapter.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::DispatchContext;
use crate::error::PipelineResult;
use crate::pipeline::Next;

/// Future returned by closure middleware.
pub type MiddlewareFuture<'a> = BoxFuture<'a, PipelineResult<()>>;

/// A unit of processing in a [`Pipeline`](crate::Pipeline).
///
/// Code before `next.run(ctx).await` runs before every downstream
/// middleware; code after it runs once they have all completed. Not calling
/// `next` ends the chain at this middleware without an error. Calling it a
/// second time is a protocol violation and fails the execution.
#[async_trait]
pub trait Middleware<P>: Send + Sync
where
    P: Send + Sync + 'static,
{
    /// Process the context, optionally continuing down the chain.
    async fn handle(&self, ctx: &mut DispatchContext<P>, next: Next<'_, P>) -> PipelineResult<()>;

    /// Optional name for logging.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Middleware backed by a closure. See [`middleware_fn`].
pub struct FnMiddleware<P, F> {
    name: String,
    f: F,
    _payload: PhantomData<fn(P)>,
}

impl<P, F> FnMiddleware<P, F> {
    /// Set the name reported in logs.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<P, F> fmt::Debug for FnMiddleware<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Build middleware from a closure returning a boxed future.
///
/// ```rust
/// use herald_pipeline::{Pipeline, middleware_fn};
///
/// let pipeline: Pipeline<u32> = Pipeline::new();
/// pipeline.push(middleware_fn::<u32, _>(|ctx, next| {
///     Box::pin(async move {
///         ctx.payload += 1;
///         next.run(ctx).await
///     })
/// }));
/// assert_eq!(pipeline.len(), 1);
/// ```
pub fn middleware_fn<P, F>(f: F) -> FnMiddleware<P, F>
where
    P: Send + Sync + 'static,
    F: for<'a> Fn(&'a mut DispatchContext<P>, Next<'a, P>) -> MiddlewareFuture<'a>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware {
        name: "fn".to_string(),
        f,
        _payload: PhantomData,
    }
}

#[async_trait]
impl<P, F> Middleware<P> for FnMiddleware<P, F>
where
    P: Send + Sync + 'static,
    F: for<'a> Fn(&'a mut DispatchContext<P>, Next<'a, P>) -> MiddlewareFuture<'a>
        + Send
        + Sync
        + 'static,
{
    async fn handle(&self, ctx: &mut DispatchContext<P>, next: Next<'_, P>) -> PipelineResult<()> {
        (self.f)(ctx, next).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
