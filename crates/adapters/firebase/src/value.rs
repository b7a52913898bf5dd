//! Firestore typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type,
//! e.g. `{"integerValue": "42"}`. Integers travel as strings.

use crate::FirebaseError;
use chrono::{DateTime, SecondsFormat, Utc};
use ride_admin_core::{Document, FieldValue, Fields};
use serde_json::{json, Map, Value};

/// Encodes one value.
pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Boolean(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
        FieldValue::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        FieldValue::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Encodes a field map into the `fields` object of a document body.
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect::<Map<String, Value>>(),
    )
}

/// Decodes one value. Unknown shapes decode to `Null`.
pub fn decode_value(value: &Value) -> FieldValue {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return FieldValue::Null;
    };

    match kind.as_str() {
        "booleanValue" => inner.as_bool().map_or(FieldValue::Null, FieldValue::Boolean),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| inner.as_i64())
            .map_or(FieldValue::Null, FieldValue::Integer),
        "doubleValue" => inner.as_f64().map_or(FieldValue::Null, FieldValue::Double),
        "timestampValue" => inner
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or(FieldValue::Null, |t| FieldValue::Timestamp(t.with_timezone(&Utc))),
        "stringValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map_or(FieldValue::Null, |s| FieldValue::String(s.to_string())),
        "arrayValue" => FieldValue::Array(
            inner["values"]
                .as_array()
                .map(|vs| vs.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => FieldValue::Map(decode_fields(&inner["fields"])),
        "geoPointValue" => {
            let mut point = Fields::new();
            for key in ["latitude", "longitude"] {
                if let Some(v) = inner[key].as_f64() {
                    point.insert(key.to_string(), FieldValue::Double(v));
                }
            }
            FieldValue::Map(point)
        }
        _ => FieldValue::Null,
    }
}

/// Decodes a `fields` object. A missing object is an empty map.
pub fn decode_fields(fields: &Value) -> Fields {
    fields
        .as_object()
        .map(|o| o.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect())
        .unwrap_or_default()
}

/// Decodes a document resource. The id is the last segment of `name`.
pub fn decode_document(resource: &Value) -> Result<Document, FirebaseError> {
    let name = resource["name"]
        .as_str()
        .ok_or_else(|| FirebaseError::Decode("document without a name".to_string()))?;
    let id = document_id(name)
        .ok_or_else(|| FirebaseError::Decode(format!("malformed document name '{name}'")))?;

    Ok(Document {
        id: id.to_string(),
        fields: decode_fields(&resource["fields"]),
    })
}

/// Last path segment of a document resource name.
pub fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Quotes a field path segment when it is not a plain identifier.
pub fn field_path(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}
