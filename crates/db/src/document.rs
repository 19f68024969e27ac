//! JSON document representation and dotted-path helpers.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Name of the primary key field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// Serialize a value into a document. Fails if it does not serialize to an object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::NotADocument(json_type(&other))),
    }
}

/// Deserialize a document into a typed model.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Every value reachable at `path`, descending into arrays along the way.
///
/// `wishlist.book` against `{"wishlist": [{"book": 1}, {"book": 2}]}` yields
/// `[1, 2]`.
pub fn values_at<'a>(document: &'a Document, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    if let Some((first, rest)) = segments.split_first() {
        if let Some(value) = document.get(*first) {
            collect(value, rest, &mut out);
        }
    }
    out
}

fn collect<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Value::Object(map) => {
            if let Some(next) = map.get(*head) {
                collect(next, rest, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, segments, out);
            }
        }
        _ => {}
    }
}

/// The value at `path` following objects only.
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Set the value at `path`, creating intermediate objects as needed.
///
/// Non-object intermediates are replaced by objects.
pub fn set_path(document: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            document.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = document
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}

/// True when `candidate` equals `target`, or is an array containing it.
pub fn value_matches(candidate: &Value, target: &Value) -> bool {
    if candidate == target {
        return true;
    }
    match candidate {
        Value::Array(items) => items.iter().any(|item| item == target),
        _ => false,
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
