//! Shared helpers for the integration tests.

use std::sync::{Arc, Mutex};

use herald_channel::{Channel, Schema};
use herald_pipeline::{DispatchContext, Middleware, Next, PipelineResult};
use herald_test::RecordingTransport;

/// A fresh recording transport, shared with the test.
#[allow(dead_code)]
pub fn transport() -> Arc<RecordingTransport> {
    herald_test::setup_test_logging_default();
    Arc::new(RecordingTransport::new())
}

/// A channel with default settings on `transport`.
#[allow(dead_code)]
pub fn channel_on<S: Schema>(
    schema: S,
    name: &str,
    transport: &Arc<RecordingTransport>,
) -> Channel<S> {
    Channel::new(schema, name, transport.clone())
}

/// Middleware that records `before:<label>` and `after:<label>` around `next`.
#[allow(dead_code)]
pub struct Tracer {
    pub label: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Tracer {
    pub fn new(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label,
            log: Arc::clone(log),
        }
    }

    fn record(&self, step: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{step}:{}", self.label));
    }
}

#[async_trait::async_trait]
impl<P: Send + Sync + 'static> Middleware<P> for Tracer {
    fn name(&self) -> &str {
        self.label
    }

    async fn handle(&self, ctx: &mut DispatchContext<P>, next: Next<'_, P>) -> PipelineResult<()> {
        self.record("before");
        next.run(ctx).await?;
        self.record("after");
        Ok(())
    }
}
