//! Document store client factory and migration tooling.
//!
//! Modules talk to storage through [`Database`] and [`Collection`] handles,
//! which wrap a [`DocumentStore`] backend chosen from the configured endpoint.

use std::sync::Arc;

use serde_json::Value;

pub mod document;
pub mod error;
pub mod filter;
pub mod memory;
pub mod migrate;
pub mod options;
pub mod pipeline;
pub mod store;
pub mod update;

pub use document::{from_document, to_document, Document, ID_FIELD};
pub use error::StoreError;
pub use filter::Filter;
pub use memory::MemoryStore;
pub use migrate::{Migration, Schema};
pub use options::{FindOptions, Projection, Sort, SortOrder, UpdateOptions};
pub use pipeline::Stage;
pub use store::{DeleteOutcome, DocumentStore, InsertOutcome, UpdateOutcome};
pub use update::{Update, UpdateOp};

/// Shared handle to a named database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    name: Arc<str>,
    store: Arc<dyn DocumentStore>,
}

impl Database {
    /// Open the backend named by `endpoint`.
    ///
    /// Supported endpoints are `memory://` and `file://<snapshot path>`.
    pub async fn connect(endpoint: &str, name: &str) -> Result<Self, StoreError> {
        let store: Arc<dyn DocumentStore> = match endpoint.split_once("://") {
            Some(("memory", _)) => Arc::new(MemoryStore::new()),
            Some(("file", path)) if !path.is_empty() => Arc::new(MemoryStore::open(path).await?),
            _ => return Err(StoreError::UnsupportedEndpoint(endpoint.to_string())),
        };

        tracing::info!(target: "catalog-db", %endpoint, database = name, "document store opened");
        Ok(Self::with_store(name, store))
    }

    pub fn with_store(name: &str, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            name: Arc::from(name),
            store,
        }
    }

    /// Fresh in-memory database, mostly for tests.
    pub fn in_memory(name: &str) -> Self {
        Self::with_store(name, Arc::new(MemoryStore::new()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            name: Arc::from(name),
            store: self.store.clone(),
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Flush and release the backend. Later calls fail with [`StoreError::Closed`].
    pub async fn close(&self) -> Result<(), StoreError> {
        tracing::info!(target: "catalog-db", database = %self.name, "closing document store");
        self.store.close().await
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

/// Handle to one collection of a [`Database`].
#[derive(Clone)]
pub struct Collection {
    name: Arc<str>,
    store: Arc<dyn DocumentStore>,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn insert_one(&self, document: Document) -> Result<InsertOutcome, StoreError> {
        tracing::debug!(target: "catalog-db", collection = %self.name, "insert_one");
        self.store.insert_one(&self.name, document).await
    }

    pub async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(target: "catalog-db", collection = %self.name, ?filter, "find");
        self.store.find(&self.name, filter, options).await
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.find_one_with(filter, None).await
    }

    /// First match, reshaped by `projection` when given.
    pub async fn find_one_with(
        &self,
        filter: &Filter,
        projection: Option<Projection>,
    ) -> Result<Option<Document>, StoreError> {
        let mut options = FindOptions::default().limit(1);
        options.projection = projection;
        Ok(self.find(filter, &options).await?.into_iter().next())
    }

    /// Look up a document by `_id`.
    pub async fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<Document>, StoreError> {
        self.find_one(&Filter::eq(ID_FIELD, id)).await
    }

    pub async fn update_one(
        &self,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome, StoreError> {
        tracing::debug!(target: "catalog-db", collection = %self.name, ?filter, upsert = options.upsert, "update_one");
        self.store
            .update_one(&self.name, filter, update, options)
            .await
    }

    pub async fn delete_one(&self, filter: &Filter) -> Result<DeleteOutcome, StoreError> {
        tracing::debug!(target: "catalog-db", collection = %self.name, ?filter, "delete_one");
        self.store.delete_one(&self.name, filter).await
    }

    pub async fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(target: "catalog-db", collection = %self.name, stages = pipeline.len(), "aggregate");
        self.store.aggregate(&self.name, pipeline).await
    }
}
