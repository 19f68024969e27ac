use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::document::Document;
use crate::error::StoreError;
use crate::filter::Filter;
use crate::options::{FindOptions, UpdateOptions};
use crate::pipeline::Stage;
use crate::update::Update;

/// Result of an insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

/// Result of an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Value>,
}

impl UpdateOutcome {
    /// True when the call created a new document.
    pub fn upserted(&self) -> bool {
        self.upserted_id.is_some()
    }
}

/// Result of a delete.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Operations a document store backend must provide.
///
/// Every call is atomic with respect to other calls on the same store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Verify the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a document, generating `_id` when absent.
    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<InsertOutcome, StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Update the first document matching `filter`.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Delete the first document matching `filter`.
    async fn delete_one(&self, collection: &str, filter: &Filter)
        -> Result<DeleteOutcome, StoreError>;

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> Result<Vec<Document>, StoreError>;

    /// Create the collection if it does not exist.
    async fn create_collection(&self, collection: &str) -> Result<(), StoreError>;

    /// Enforce uniqueness of `field` across the collection's documents.
    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Persist buffered state and refuse further calls.
    async fn close(&self) -> Result<(), StoreError>;
}
