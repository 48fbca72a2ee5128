//! Canonical JSON serialization.
//!
//! Object keys are sorted recursively before serialization so two documents
//! with the same content always produce the same bytes, whatever key order
//! the upstream tooling emitted. Array order is significant and preserved.

use serde::Serialize;
use serde_json::{Map, Value};

/// Sort object keys recursively. Arrays keep their element order.
pub fn canonicalize(value: Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(String, Value)> = map.into_iter().collect();
      entries.sort_by(|a, b| a.0.cmp(&b.0));

      let mut sorted = Map::new();
      for (key, value) in entries {
        sorted.insert(key, canonicalize(value));
      }
      Value::Object(sorted)
    }
    Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
    other => other,
  }
}

/// Serialize to compact JSON with recursively sorted keys.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
  let value = serde_json::to_value(value)?;
  serde_json::to_string(&canonicalize(value))
}
