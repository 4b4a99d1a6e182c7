//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_test::prelude::*;` to import all test utilities.

// Mocks
pub use crate::{CallCounter, Collector, RecordedEvent, RecordingTransport};

// Fixtures
pub use crate::{NamedPayload, ValuePayload, name_schema, value_schema};

// Harness
pub use crate::{setup_test_logging, setup_test_logging_default};
