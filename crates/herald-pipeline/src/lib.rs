//! Herald Pipeline - Onion-ordered async middleware.
//!
//! A [`Pipeline`] runs its middleware in insertion order. Each middleware
//! receives the mutable [`DispatchContext`] and a [`Next`] continuation;
//! work done after `next.run(ctx).await` happens once everything downstream
//! has finished, giving the familiar onion shape.
//!
//! # Example
//!
//! ```rust
//! use herald_pipeline::{DispatchContext, Pipeline};
//!
//! let pipeline: Pipeline<Vec<u8>> = Pipeline::new();
//! pipeline.push_fn(|ctx, next| {
//!     Box::pin(async move {
//!         ctx.payload.push(1);
//!         next.run(ctx).await?;
//!         ctx.payload.push(4);
//!         Ok(())
//!     })
//! });
//! pipeline.push_fn(|ctx, next| {
//!     Box::pin(async move {
//!         ctx.payload.push(2);
//!         next.run(ctx).await?;
//!         ctx.payload.push(3);
//!         Ok(())
//!     })
//! });
//!
//! let mut ctx = DispatchContext::new("numbers", Vec::new());
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(pipeline.execute(&mut ctx)).unwrap();
//! assert_eq!(ctx.payload, vec![1, 2, 3, 4]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod middleware;
mod pipeline;

pub use context::DispatchContext;
pub use error::{BoxError, PipelineError, PipelineResult};
pub use middleware::{FnMiddleware, Middleware, MiddlewareFuture, middleware_fn};
pub use pipeline::{Next, Pipeline};
