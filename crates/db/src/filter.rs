//! Query predicates evaluated against documents.

use serde_json::Value;

use crate::document::{set_path, value_matches, values_at, Document};

/// A composable predicate over documents.
///
/// Field names are dotted paths; paths that cross arrays match when any
/// element matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    /// Field equals the value, or is an array containing it.
    Eq { field: String, value: Value },
    /// A string value at the field contains `needle` as a literal substring,
    /// ignoring case.
    Contains { field: String, needle: String },
    /// Every clause matches. Empty matches everything.
    And(Vec<Filter>),
    /// At least one clause matches. Empty matches nothing.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn or(clauses: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(clauses.into_iter().collect())
    }

    /// Evaluate the predicate against a document.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => values_at(document, field)
                .into_iter()
                .any(|candidate| value_matches(candidate, value)),
            Filter::Contains { field, needle } => {
                let needle = needle.to_lowercase();
                values_at(document, field)
                    .into_iter()
                    .any(|candidate| contains(candidate, &needle))
            }
            Filter::And(clauses) => clauses.iter().all(|clause| clause.matches(document)),
            Filter::Or(clauses) => clauses.iter().any(|clause| clause.matches(document)),
        }
    }

    /// Fields pinned by top-level equality clauses.
    ///
    /// Used as the starting document when an upsert finds no match.
    pub fn equality_seed(&self) -> Document {
        let mut seed = Document::new();
        self.collect_equalities(&mut seed);
        seed
    }

    fn collect_equalities(&self, seed: &mut Document) {
        match self {
            Filter::Eq { field, value } => set_path(seed, field, value.clone()),
            Filter::And(clauses) => {
                for clause in clauses {
                    clause.collect_equalities(seed);
                }
            }
            _ => {}
        }
    }
}

/// `needle` must already be lowercase.
fn contains(candidate: &Value, needle: &str) -> bool {
    match candidate {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|item| contains(item, needle)),
        _ => false,
    }
}
