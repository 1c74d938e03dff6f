//! Conversion of store-native values into transport-safe primitives.
//!
//! Identifiers become their hex string and instants their RFC 3339 string.
//! Nested documents and arrays are converted recursively; every other value is
//! returned unchanged, so converting twice is the same as converting once.

use toolhub_types::{Document, Value, format_instant};

/// Transport-safe copy of a single value.
pub fn serialize_value(value: &Value) -> Value {
    match value {
        Value::ObjectId(id) => Value::String(id.to_hex()),
        Value::DateTime(dt) => Value::String(format_instant(dt)),
        Value::Document(doc) => Value::Document(serialize_document(doc)),
        Value::Array(items) => Value::Array(items.iter().map(serialize_value).collect()),
        scalar => scalar.clone(),
    }
}

/// Transport-safe copy of a document.
pub fn serialize_document(doc: &Document) -> Document {
    doc.iter()
        .map(|(k, v)| (k.clone(), serialize_value(v)))
        .collect()
}
