//! Storage encoding of documents.
//!
//! Bodies are stored as JSON text. Identifiers and instants are wrapped in
//! single-key objects (`{"$oid": ..}`, `{"$date": ..}`) so they survive the
//! round trip and stay addressable from SQL paths. Instants use the fixed-width
//! format from [`format_instant`], so their text order is their time order.
//!
//! Caller keys starting with `$` are escaped with one more `$` on the way in and
//! unescaped on the way out, so a stored `{"$oid": ..}` or `{"$date": ..}` can
//! only have been written by the encoder.

use serde_json::{Map, Value as JsonValue};
use toolhub_types::{Document, ObjectId, Value, format_instant, parse_instant};

pub(crate) const OID_KEY: &str = "$oid";
pub(crate) const DATE_KEY: &str = "$date";

const ESCAPE: char = '$';

pub(crate) fn encode_document(doc: &Document) -> JsonValue {
    JsonValue::Object(
        doc.iter()
            .map(|(k, v)| (escape_key(k), encode_value(v)))
            .collect(),
    )
}

fn escape_key(key: &str) -> String {
    if key.starts_with(ESCAPE) {
        format!("{ESCAPE}{key}")
    } else {
        key.to_string()
    }
}

fn unescape_key(key: String) -> String {
    match key.strip_prefix(ESCAPE) {
        Some(rest) if rest.starts_with(ESCAPE) => rest.to_string(),
        _ => key,
    }
}

fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::ObjectId(id) => wrapped(OID_KEY, id.to_hex()),
        Value::DateTime(dt) => wrapped(DATE_KEY, format_instant(dt)),
        Value::Array(items) => JsonValue::Array(items.iter().map(encode_value).collect()),
        Value::Document(doc) => encode_document(doc),
        scalar => scalar.to_json(),
    }
}

fn wrapped(key: &str, text: String) -> JsonValue {
    let mut map = Map::new();
    map.insert(key.to_string(), JsonValue::String(text));
    JsonValue::Object(map)
}

pub(crate) fn decode_document(json: JsonValue) -> Document {
    match decode_value(json) {
        Value::Document(doc) => doc,
        _ => Document::new(),
    }
}

fn decode_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Array(items) => Value::Array(items.into_iter().map(decode_value).collect()),
        JsonValue::Object(map) => {
            if let Some(native) = unwrap_native(&map) {
                return native;
            }
            Value::Document(
                map.into_iter()
                    .map(|(k, v)| (unescape_key(k), decode_value(v)))
                    .collect(),
            )
        }
        scalar => Value::from_json(scalar),
    }
}

fn unwrap_native(map: &Map<String, JsonValue>) -> Option<Value> {
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    let text = inner.as_str()?;
    match key.as_str() {
        OID_KEY => text.parse::<ObjectId>().ok().map(Value::ObjectId),
        DATE_KEY => parse_instant(text).map(Value::DateTime),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_native_kinds_survive_storage() {
        let id = ObjectId::new();
        let at = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        let mut inner = Document::new();
        inner.insert("seen", at);

        let mut doc = Document::new();
        doc.insert("ref", id);
        doc.insert("at", at);
        doc.insert("history", vec![Value::from(at), Value::from(1)]);
        doc.insert("inner", inner);
        doc.insert("ratio", 1.5);

        let encoded = encode_document(&doc);
        assert_eq!(encoded["at"]["$date"], "2025-02-03T04:05:06.000000Z");
        assert_eq!(encoded["ref"]["$oid"], id.to_hex());

        let text = serde_json::to_string(&encoded).unwrap();
        let decoded = decode_document(serde_json::from_str(&text).unwrap());
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_unparseable_wrappers_stay_documents() {
        let json = serde_json::json!({
            "meta": {"$date": "yesterday"},
            "pair": {"$oid": "x", "extra": 1}
        });
        let doc = decode_document(json);
        assert_eq!(
            doc.get_document("meta").and_then(|m| m.get_str("$date")),
            Some("yesterday")
        );
        assert!(doc.get_document("pair").is_some());
    }

    #[test]
    fn test_dollar_keys_from_callers_are_not_read_as_native() {
        let id = ObjectId::new();
        let meta = Document::from_json(serde_json::json!({
            "when": {"$date": "2025-01-01T00:00:00Z"},
            "ref": {"$oid": id.to_hex()},
            "$$already": 1,
            "big": u64::MAX
        }))
        .unwrap();
        let mut doc = Document::new();
        doc.insert("metadata", meta.clone());

        let encoded = encode_document(&doc);
        assert_eq!(encoded["metadata"]["when"]["$$date"], "2025-01-01T00:00:00Z");
        assert_eq!(encoded["metadata"]["$$$already"], 1);

        let text = serde_json::to_string(&encoded).unwrap();
        let decoded = decode_document(serde_json::from_str(&text).unwrap());
        assert_eq!(decoded.get_document("metadata"), Some(&meta));
        assert_eq!(
            decoded.get_document("metadata").unwrap().get("big"),
            Some(&Value::UInt(u64::MAX))
        );
    }
}
