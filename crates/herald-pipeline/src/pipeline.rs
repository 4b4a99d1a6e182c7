//! Ordered middleware chain and its executor.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::BoxFuture;
use tracing::{debug, trace, warn};

use crate::context::DispatchContext;
use crate::error::{PipelineError, PipelineResult};
use crate::middleware::{Middleware, MiddlewareFuture, middleware_fn};

type Chain<P> = [Arc<dyn Middleware<P>>];

/// Per-execution record of how far the chain has advanced.
#[derive(Debug, Default)]
struct Cursor {
    /// One past the highest position advanced to; zero before the first step.
    advanced: AtomicUsize,
    /// First rejected position, kept so a swallowed violation still fails the run.
    violation: OnceLock<usize>,
}

impl Cursor {
    fn advance(&self, position: usize) -> PipelineResult<()> {
        let previous = self
            .advanced
            .fetch_max(position.saturating_add(1), Ordering::SeqCst);
        if position < previous {
            let _ = self.violation.set(position);
            warn!(position, "Continuation invoked more than once");
            return Err(PipelineError::NextCalledMultipleTimes { position });
        }
        Ok(())
    }

    fn violation(&self) -> Option<usize> {
        self.violation.get().copied()
    }
}

/// Continuation handed to each middleware.
///
/// `run` resumes the rest of the chain. It may be called at most once per
/// middleware activation.
pub struct Next<'a, P> {
    chain: &'a Chain<P>,
    position: usize,
    cursor: &'a Cursor,
}

impl<P> fmt::Debug for Next<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.position)
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

impl<P> Next<'_, P>
where
    P: Send + Sync + 'static,
{
    /// Run the remaining middleware and wait for them to complete.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NextCalledMultipleTimes`] if this continuation
    /// (or one upstream of it) was already used, or the error of any
    /// downstream middleware.
    pub async fn run(&self, ctx: &mut DispatchContext<P>) -> PipelineResult<()> {
        step(self.chain, self.position, self.cursor, ctx).await
    }

    /// Number of middleware still ahead of this continuation.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.position)
    }
}

fn step<'a, P>(
    chain: &'a Chain<P>,
    position: usize,
    cursor: &'a Cursor,
    ctx: &'a mut DispatchContext<P>,
) -> BoxFuture<'a, PipelineResult<()>>
where
    P: Send + Sync + 'static,
{
    Box::pin(async move {
        cursor.advance(position)?;

        let Some(middleware) = chain.get(position) else {
            return Ok(());
        };

        trace!(
            channel = %ctx.channel,
            dispatch_id = %ctx.dispatch_id,
            middleware = %middleware.name(),
            position,
            "Running middleware"
        );

        let next = Next {
            chain,
            position: position.saturating_add(1),
            cursor,
        };
        middleware.handle(ctx, next).await
    })
}

/// An ordered, append-only chain of middleware.
///
/// Insertion order is execution order. [`execute`](Self::execute) snapshots
/// the chain when it starts; middleware pushed while an execution is in
/// flight only applies to later executions.
pub struct Pipeline<P> {
    middlewares: RwLock<Vec<Arc<dyn Middleware<P>>>>,
}

impl<P> fmt::Debug for Pipeline<P>
where
    P: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("middlewares", &self.names())
            .finish()
    }
}

impl<P> Default for Pipeline<P>
where
    P: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Pipeline<P>
where
    P: Send + Sync + 'static,
{
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            middlewares: RwLock::new(Vec::new()),
        }
    }

    /// Create a pipeline from an initial list of middleware.
    #[must_use]
    pub fn with_middlewares(middlewares: Vec<Arc<dyn Middleware<P>>>) -> Self {
        Self {
            middlewares: RwLock::new(middlewares),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn Middleware<P>>>> {
        self.middlewares.read().unwrap_or_else(|e| {
            warn!("Pipeline read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn Middleware<P>>>> {
        self.middlewares.write().unwrap_or_else(|e| {
            warn!("Pipeline lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Append a middleware to the end of the chain.
    pub fn push<M>(&self, middleware: M)
    where
        M: Middleware<P> + 'static,
    {
        self.push_arc(Arc::new(middleware));
    }

    /// Append a shared middleware to the end of the chain.
    pub fn push_arc(&self, middleware: Arc<dyn Middleware<P>>) {
        debug!(middleware = %middleware.name(), "Middleware added");
        self.write().push(middleware);
    }

    /// Append a closure middleware. See [`middleware_fn`].
    pub fn push_fn<F>(&self, f: F)
    where
        F: for<'a> Fn(&'a mut DispatchContext<P>, Next<'a, P>) -> MiddlewareFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.push(middleware_fn(f));
    }

    /// Append several middleware, preserving their order.
    pub fn extend<I>(&self, middlewares: I)
    where
        I: IntoIterator<Item = Arc<dyn Middleware<P>>>,
    {
        let mut chain = self.write();
        for middleware in middlewares {
            debug!(middleware = %middleware.name(), "Middleware added");
            chain.push(middleware);
        }
    }

    /// Number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Names of the middleware, in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|m| m.name().to_string()).collect()
    }

    /// Run the chain over `ctx`, starting at the first middleware.
    ///
    /// Each call is an independent run with its own continuation tracking.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a middleware, unchanged, or
    /// [`PipelineError::NextCalledMultipleTimes`] if any continuation was
    /// invoked twice, even when the offending middleware swallowed the error.
    pub async fn execute(&self, ctx: &mut DispatchContext<P>) -> PipelineResult<()> {
        let chain: Vec<Arc<dyn Middleware<P>>> = self.read().clone();
        let cursor = Cursor::default();

        let result = step(&chain, 0, &cursor, ctx).await;

        match (result, cursor.violation()) {
            (Err(e), _) => {
                debug!(
                    channel = %ctx.channel,
                    dispatch_id = %ctx.dispatch_id,
                    error = %e,
                    "Pipeline failed"
                );
                Err(e)
            },
            (Ok(()), Some(position)) => Err(PipelineError::NextCalledMultipleTimes { position }),
            (Ok(()), None) => Ok(()),
        }
    }
}
