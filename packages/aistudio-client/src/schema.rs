//! Lenient OpenAPI schema resolution for `json` output.
//!
//! A schema typo must not sink a whole submission: anything that is not a
//! JSON object resolves to `{}`. The fallback is reported through
//! [`SchemaResolution::Degraded`] so callers and tests can see it happened.

use serde_json::{Map, Value};
use tracing::warn;

pub type Schema = Map<String, Value>;

/// Outcome of resolving user-supplied schema input.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaResolution {
    /// Input was (or parsed to) a JSON object
    Provided(Schema),
    /// Nothing supplied: absent, null or blank text
    Empty,
    /// Input was unusable and has been replaced with `{}`
    Degraded { reason: String },
}

impl SchemaResolution {
    /// Resolve loosely-typed schema input: an object, serialized JSON text,
    /// or nothing.
    pub fn resolve(input: Option<&Value>) -> Self {
        match input {
            None | Some(Value::Null) => SchemaResolution::Empty,
            Some(Value::Object(map)) => SchemaResolution::Provided(map.clone()),
            Some(Value::String(text)) => Self::parse(text),
            Some(other) => SchemaResolution::Degraded {
                reason: format!("expected a JSON object, got {}", json_kind(other)),
            },
        }
    }

    /// Resolve schema text.
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return SchemaResolution::Empty;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => SchemaResolution::Provided(map),
            Ok(other) => SchemaResolution::Degraded {
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            },
            Err(e) => SchemaResolution::Degraded {
                reason: format!("schema is not valid JSON: {}", e),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SchemaResolution::Degraded { .. })
    }

    /// The schema to send; never null.
    pub fn into_schema(self) -> Schema {
        match self {
            SchemaResolution::Provided(schema) => schema,
            SchemaResolution::Empty => Schema::new(),
            SchemaResolution::Degraded { reason } => {
                warn!(%reason, "Ignoring unusable JSON schema, sending an empty one");
                Schema::new()
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
