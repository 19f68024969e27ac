//! Update operators applied to a single matched document.

use serde_json::Value;

use crate::document::{get_path, json_type, set_path, Document, ID_FIELD};
use crate::error::StoreError;

/// A single update operator.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replace the value at each dotted path.
    Set(Document),
    /// Append a value to the array at `field`, creating it when missing.
    Push { field: String, value: Value },
    /// Merge `element` into the array entry whose `key` matches, or append it.
    ///
    /// Together with an upserting `update_one` this is a match-or-insert on an
    /// embedded array in one store call.
    UpsertElement {
        array: String,
        key: String,
        element: Document,
    },
}

/// An ordered list of operators applied atomically to one document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    pub fn set(fields: Document) -> Self {
        Self::default().then(UpdateOp::Set(fields))
    }

    pub fn push(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().then(UpdateOp::Push {
            field: field.into(),
            value: value.into(),
        })
    }

    pub fn upsert_element(
        array: impl Into<String>,
        key: impl Into<String>,
        element: Document,
    ) -> Self {
        Self::default().then(UpdateOp::UpsertElement {
            array: array.into(),
            key: key.into(),
            element,
        })
    }

    /// Append another operator.
    pub fn then(mut self, op: UpdateOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Apply every operator to `document`. Returns whether anything changed.
    pub(crate) fn apply(&self, document: &mut Document) -> Result<bool, StoreError> {
        let mut modified = false;
        for op in &self.ops {
            modified |= apply_op(op, document)?;
        }
        Ok(modified)
    }
}

fn apply_op(op: &UpdateOp, document: &mut Document) -> Result<bool, StoreError> {
    match op {
        UpdateOp::Set(fields) => {
            let mut modified = false;
            for (path, value) in fields {
                let current = get_path(document, path);
                if current == Some(value) {
                    continue;
                }
                if path == ID_FIELD && current.is_some() {
                    return Err(StoreError::InvalidUpdate(format!(
                        "field '{ID_FIELD}' is immutable"
                    )));
                }
                set_path(document, path, value.clone());
                modified = true;
            }
            Ok(modified)
        }
        UpdateOp::Push { field, value } => {
            array_at(document, field)?.push(value.clone());
            Ok(true)
        }
        UpdateOp::UpsertElement {
            array,
            key,
            element,
        } => {
            let Some(key_value) = element.get(key) else {
                return Err(StoreError::InvalidUpdate(format!(
                    "element for '{array}' is missing key field '{key}'"
                )));
            };

            let items = array_at(document, array)?;
            let existing = items.iter_mut().find_map(|item| {
                item.as_object_mut()
                    .filter(|entry| entry.get(key) == Some(key_value))
            });

            match existing {
                Some(entry) => {
                    let mut modified = false;
                    for (field, value) in element {
                        if entry.get(field) != Some(value) {
                            entry.insert(field.clone(), value.clone());
                            modified = true;
                        }
                    }
                    Ok(modified)
                }
                None => {
                    items.push(Value::Object(element.clone()));
                    Ok(true)
                }
            }
        }
    }
}

/// Mutable access to the array at `path`, created empty when missing.
fn array_at<'a>(document: &'a mut Document, path: &str) -> Result<&'a mut Vec<Value>, StoreError> {
    if get_path(document, path).is_none() {
        set_path(document, path, Value::Array(Vec::new()));
    }

    let mut segments = path.split('.');
    let mut current = segments.next().and_then(|first| document.get_mut(first));
    for segment in segments {
        current = current
            .and_then(Value::as_object_mut)
            .and_then(|map| map.get_mut(segment));
    }

    match current {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(StoreError::InvalidUpdate(format!(
            "field '{path}' is a {}, not an array",
            json_type(other)
        ))),
        None => Err(StoreError::InvalidUpdate(format!(
            "field '{path}' cannot hold an array"
        ))),
    }
}
