//! Options shared by find and update calls.

use crate::document::{get_path, set_path, Document, ID_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    /// Insertion order.
    Natural(SortOrder),
}

/// Field selection applied to returned documents.
///
/// Keeps only the listed paths, plus `_id` unless `with_id` is false.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    fields: Vec<String>,
    with_id: bool,
}

impl Projection {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            with_id: true,
        }
    }

    pub fn without_id(mut self) -> Self {
        self.with_id = false;
        self
    }

    pub fn apply(&self, document: &Document) -> Document {
        let mut projected = Document::new();
        if self.with_id {
            if let Some(id) = document.get(ID_FIELD) {
                projected.insert(ID_FIELD.to_string(), id.clone());
            }
        }
        for field in &self.fields {
            if let Some(value) = get_path(document, field) {
                set_path(&mut projected, field, value.clone());
            }
        }
        projected
    }
}

/// Options for `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
    pub projection: Option<Projection>,
}

impl FindOptions {
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// Options for `update_one`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a new document built from the filter's equality clauses when
    /// nothing matches.
    pub upsert: bool,
}

impl UpdateOptions {
    pub fn upsert() -> Self {
        Self { upsert: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn include_without_id_keeps_only_listed_fields() {
        let book = json!({"_id": "1", "title": "Dune", "reviews": ["good"]});
        let projected = Projection::include(["reviews"])
            .without_id()
            .apply(book.as_object().unwrap());
        assert_eq!(Value::Object(projected), json!({"reviews": ["good"]}));
    }

    #[test]
    fn include_keeps_id_and_nested_paths() {
        let wishlist = json!({"_id": "w1", "user": "a@x.com", "meta": {"owner": "a", "tag": "x"}});
        let projected = Projection::include(["meta.owner"]).apply(wishlist.as_object().unwrap());
        assert_eq!(
            Value::Object(projected),
            json!({"_id": "w1", "meta": {"owner": "a"}})
        );
    }
}
