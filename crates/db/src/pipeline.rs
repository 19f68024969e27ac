//! Aggregation pipeline stages and their evaluation.

use serde_json::Value;

use crate::document::{get_path, set_path, value_matches, values_at, Document, ID_FIELD};
use crate::filter::Filter;
use crate::options::Projection;

/// One stage of an aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching the filter.
    Match(Filter),
    /// Reshape each document.
    Project(Projection),
    /// Emit one document per element of the array at `path`.
    ///
    /// Documents whose array is missing or empty are dropped.
    Unwind(String),
    /// Join documents of another collection whose `foreign_field` equals the
    /// value at `local_field`. Matches are stored as an array at `as_field`.
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// Collect the value at `source` of every document, in order, into the
    /// array `into` of a single document with a null `_id`.
    ///
    /// Emits nothing when no document has a value at `source`.
    Group { into: String, source: String },
}

impl Stage {
    pub fn unwind(path: impl Into<String>) -> Self {
        Self::Unwind(path.into())
    }

    pub fn lookup(
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Self::Lookup {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        }
    }

    /// Push `source` of all documents into one array named `into`.
    pub fn collect_all(into: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Group {
            into: into.into(),
            source: source.into(),
        }
    }
}

/// Run `stages` over `documents`.
///
/// `foreign` resolves a collection name to its documents for lookup stages.
pub fn run<'a, F>(stages: &[Stage], mut documents: Vec<Document>, foreign: F) -> Vec<Document>
where
    F: Fn(&str) -> &'a [Document],
{
    for stage in stages {
        documents = match stage {
            Stage::Match(filter) => documents
                .into_iter()
                .filter(|document| filter.matches(document))
                .collect(),
            Stage::Project(projection) => documents
                .iter()
                .map(|document| projection.apply(document))
                .collect(),
            Stage::Unwind(path) => documents
                .into_iter()
                .flat_map(|document| unwind(document, path))
                .collect(),
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                as_field,
            } => {
                let candidates = foreign(from);
                documents
                    .into_iter()
                    .map(|mut document| {
                        let joined = join(&document, local_field, candidates, foreign_field);
                        set_path(&mut document, as_field, Value::Array(joined));
                        document
                    })
                    .collect()
            }
            Stage::Group { into, source } => group(&documents, into, source),
        };
    }
    documents
}

fn unwind(document: Document, path: &str) -> Vec<Document> {
    match get_path(&document, path) {
        Some(Value::Array(items)) => items
            .clone()
            .into_iter()
            .map(|item| {
                let mut copy = document.clone();
                set_path(&mut copy, path, item);
                copy
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => vec![document],
    }
}

fn join(
    document: &Document,
    local_field: &str,
    candidates: &[Document],
    foreign_field: &str,
) -> Vec<Value> {
    let local = values_at(document, local_field);
    if local.is_empty() {
        return Vec::new();
    }

    candidates
        .iter()
        .filter(|candidate| {
            values_at(candidate, foreign_field)
                .into_iter()
                .any(|foreign| local.iter().any(|value| value_matches(foreign, value)))
        })
        .map(|candidate| Value::Object(candidate.clone()))
        .collect()
}

fn group(documents: &[Document], into: &str, source: &str) -> Vec<Document> {
    let values: Vec<Value> = documents
        .iter()
        .filter_map(|document| get_path(document, source).cloned())
        .collect();
    if values.is_empty() {
        return Vec::new();
    }

    let mut grouped = Document::new();
    grouped.insert(ID_FIELD.to_string(), Value::Null);
    grouped.insert(into.to_string(), Value::Array(values));
    vec![grouped]
}
