//! Payload types and schemas shared by tests.

use herald_channel::{Schema, SchemaError, schema_fn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the JSON type of `value`, as used in schema messages.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Typed form of the `{ name: string }` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedPayload {
    /// The name.
    pub name: String,
}

impl NamedPayload {
    /// Create a payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The payload as JSON, ready for a [`name_schema`] channel.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "name": self.name })
    }
}

/// Schema for JSON payloads shaped `{ name: string }`.
///
/// Issues read like `"name: expected string, received number"`.
#[must_use]
pub fn name_schema() -> impl Schema<Payload = Value> {
    schema_fn(|payload: &Value| {
        let Some(object) = payload.as_object() else {
            return Err(SchemaError::single(
                "",
                format!("expected object, received {}", json_type_name(payload)),
            ));
        };

        match object.get("name") {
            Some(Value::String(_)) => Ok(()),
            Some(other) => Err(SchemaError::single(
                "name",
                format!("expected string, received {}", json_type_name(other)),
            )),
            None => Err(SchemaError::single("name", "required")),
        }
    })
}

/// A payload carrying one integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePayload {
    /// The value.
    pub value: i64,
}

impl ValuePayload {
    /// Create a payload.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self { value }
    }
}

/// Schema accepting [`ValuePayload`]s with a non-negative value.
#[must_use]
pub fn value_schema() -> impl Schema<Payload = ValuePayload> {
    schema_fn(|payload: &ValuePayload| {
        if payload.value < 0 {
            Err(SchemaError::single(
                "value",
                format!("must be at least 0, received {}", payload.value),
            ))
        } else {
            Ok(())
        }
    })
}
