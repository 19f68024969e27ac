//! In-process document store with optional JSON snapshot persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{get_path, Document, ID_FIELD};
use crate::error::StoreError;
use crate::filter::Filter;
use crate::options::{FindOptions, Sort, SortOrder, UpdateOptions};
use crate::pipeline::{self, Stage};
use crate::store::{DeleteOutcome, DocumentStore, InsertOutcome, UpdateOutcome};
use crate::update::Update;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionData {
    documents: Vec<Document>,
    #[serde(default)]
    unique_fields: Vec<String>,
}

impl CollectionData {
    /// Reject `candidate` if it repeats `_id` or a unique field of another document.
    fn check_unique(
        &self,
        collection: &str,
        candidate: &Document,
        skip: Option<usize>,
    ) -> Result<(), StoreError> {
        let fields = std::iter::once(ID_FIELD).chain(self.unique_fields.iter().map(String::as_str));
        for field in fields {
            let Some(value) = get_path(candidate, field) else {
                continue;
            };
            let clash = self
                .documents
                .iter()
                .enumerate()
                .any(|(index, existing)| Some(index) != skip && get_path(existing, field) == Some(value));
            if clash {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

type Collections = BTreeMap<String, CollectionData>;

/// Document store held in memory behind a single reader-writer lock.
///
/// When opened with a snapshot path, existing state is loaded on open and
/// written back on [`DocumentStore::close`]. The closed flag is only read and
/// set while holding the lock, so no call can land after the snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    snapshot: Option<PathBuf>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by a JSON snapshot file. A missing file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Collections::new(),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            target: "catalog-db",
            snapshot = %path.display(),
            collections = collections.len(),
            "loaded document snapshot"
        );

        Ok(Self {
            collections: RwLock::new(collections),
            snapshot: Some(path),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

fn new_id() -> Value {
    Value::String(Uuid::now_v7().to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        self.ensure_open()?;
        let data = collections.entry(collection.to_string()).or_default();

        let id = document
            .entry(ID_FIELD)
            .or_insert_with(new_id)
            .clone();
        data.check_unique(collection, &document, None)?;
        data.documents.push(document);

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        self.ensure_open()?;
        let Some(data) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Document> = data
            .documents
            .iter()
            .filter(|document| filter.matches(document))
            .collect();

        match &options.sort {
            None | Some(Sort::Natural(SortOrder::Ascending)) => {}
            Some(Sort::Natural(SortOrder::Descending)) => matched.reverse(),
        }

        if let Some(limit) = options.limit {
            matched.truncate(limit);
        }

        Ok(matched
            .into_iter()
            .map(|document| match &options.projection {
                Some(projection) => projection.apply(document),
                None => document.clone(),
            })
            .collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        self.ensure_open()?;
        let data = collections.entry(collection.to_string()).or_default();

        if let Some(index) = data.documents.iter().position(|document| filter.matches(document)) {
            let mut updated = data.documents[index].clone();
            let modified = update.apply(&mut updated)?;
            if modified {
                data.check_unique(collection, &updated, Some(index))?;
                data.documents[index] = updated;
            }
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
            });
        }

        if !options.upsert {
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
            });
        }

        let mut document = filter.equality_seed();
        update.apply(&mut document)?;
        let id = document
            .entry(ID_FIELD)
            .or_insert_with(new_id)
            .clone();
        data.check_unique(collection, &document, None)?;
        data.documents.push(document);

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
        })
    }

    async fn delete_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        self.ensure_open()?;
        let deleted = match collections.get_mut(collection) {
            Some(data) => match data.documents.iter().position(|document| filter.matches(document)) {
                Some(index) => {
                    data.documents.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: deleted,
        })
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Stage],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        self.ensure_open()?;
        let source = collections
            .get(collection)
            .map(|data| data.documents.clone())
            .unwrap_or_default();

        Ok(pipeline::run(pipeline, source, |name| {
            collections
                .get(name)
                .map(|data| data.documents.as_slice())
                .unwrap_or(&[])
        }))
    }

    async fn create_collection(&self, collection: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        self.ensure_open()?;
        collections.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        self.ensure_open()?;
        let data = collections.entry(collection.to_string()).or_default();
        if data.unique_fields.iter().any(|existing| existing == field) {
            return Ok(());
        }

        let mut seen: Vec<&Value> = Vec::new();
        for value in data.documents.iter().filter_map(|document| get_path(document, field)) {
            if seen.contains(&value) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
            seen.push(value);
        }

        data.unique_fields.push(field.to_string());
        Ok(())
    }

    /// Write the snapshot, then refuse further calls.
    ///
    /// A failed write leaves the store open so `close` can be retried.
    async fn close(&self) -> Result<(), StoreError> {
        let collections = self.collections.write().await;
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        if let Some(path) = &self.snapshot {
            write_snapshot(path, &collections).await?;
        }
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Replace the file at `path` via a sibling temporary file and a rename.
async fn write_snapshot(path: &Path, collections: &Collections) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(collections)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await?;

    tracing::info!(
        target: "catalog-db",
        snapshot = %path.display(),
        "wrote document snapshot"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Projection;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_generates_ids_and_find_round_trips() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_one("books", doc(json!({"title": "Dune"})))
            .await
            .unwrap();
        assert!(inserted.inserted_id.is_string());

        let found = store
            .find(
                "books",
                &Filter::eq("_id", inserted.inserted_id.clone()),
                &FindOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["title"], json!("Dune"));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = MemoryStore::new();
        store
            .insert_one("books", doc(json!({"_id": "x"})))
            .await
            .unwrap();
        let err = store
            .insert_one("books", doc(json!({"_id": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn natural_descending_sort_with_limit_returns_newest_first() {
        let store = MemoryStore::new();
        for n in 0..15 {
            store
                .insert_one("books", doc(json!({"n": n})))
                .await
                .unwrap();
        }

        let options = FindOptions::default()
            .sort(Sort::Natural(SortOrder::Descending))
            .limit(10);
        let found = store.find("books", &Filter::All, &options).await.unwrap();
        let ns: Vec<i64> = found.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, (5..15).rev().collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn natural_sort_and_projection() {
        let store = MemoryStore::new();
        for title in ["a", "b", "c"] {
            store
                .insert_one("books", doc(json!({"title": title, "secret": 1})))
                .await
                .unwrap();
        }
        let options = FindOptions::default()
            .sort(Sort::Natural(SortOrder::Ascending))
            .projection(Projection::include(["title"]).without_id());
        let found = store.find("books", &Filter::All, &options).await.unwrap();
        assert_eq!(
            found,
            vec![
                doc(json!({"title": "a"})),
                doc(json!({"title": "b"})),
                doc(json!({"title": "c"})),
            ]
        );
    }

    #[tokio::test]
    async fn update_without_match_reports_zero() {
        let store = MemoryStore::new();
        let outcome = store
            .update_one(
                "books",
                &Filter::eq("_id", "missing"),
                &Update::push("reviews", "x"),
                UpdateOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.modified_count, 0);
        assert!(!outcome.upserted());
    }

    #[tokio::test]
    async fn upsert_seeds_document_from_filter() {
        let store = MemoryStore::new();
        let entry = doc(json!({"book": "b1", "status": "want"}));
        let outcome = store
            .update_one(
                "wishlist",
                &Filter::eq("user", "a@x.com"),
                &Update::upsert_element("wishlist", "book", entry),
                UpdateOptions::upsert(),
            )
            .await
            .unwrap();
        assert!(outcome.upserted());

        let found = store
            .find("wishlist", &Filter::All, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["user"], json!("a@x.com"));
        assert_eq!(found[0]["wishlist"], json!([{"book": "b1", "status": "want"}]));
    }

    #[tokio::test]
    async fn unique_index_guards_inserts_and_existing_data() {
        let store = MemoryStore::new();
        store.create_unique_index("wishlist", "user").await.unwrap();
        store
            .insert_one("wishlist", doc(json!({"user": "a@x.com"})))
            .await
            .unwrap();
        let err = store
            .insert_one("wishlist", doc(json!({"user": "a@x.com"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref field, .. } if field == "user"));

        store
            .insert_one("dupes", doc(json!({"k": 1})))
            .await
            .unwrap();
        store
            .insert_one("dupes", doc(json!({"k": 1})))
            .await
            .unwrap();
        assert!(store.create_unique_index("dupes", "k").await.is_err());
    }

    #[tokio::test]
    async fn delete_removes_first_match_only() {
        let store = MemoryStore::new();
        for _ in 0..2 {
            store
                .insert_one("books", doc(json!({"genre": "SciFi"})))
                .await
                .unwrap();
        }
        let outcome = store
            .delete_one("books", &Filter::eq("genre", "SciFi"))
            .await
            .unwrap();
        assert_eq!(outcome.deleted_count, 1);
        let left = store
            .find("books", &Filter::All, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(left.len(), 1);
    }

    #[tokio::test]
    async fn closed_store_refuses_calls() {
        let store = MemoryStore::new();
        store.close().await.unwrap();
        assert!(matches!(store.ping().await, Err(StoreError::Closed)));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("catalog.json");

        let store = MemoryStore::open(&path).await.unwrap();
        store.create_unique_index("wishlist", "user").await.unwrap();
        store
            .insert_one("books", doc(json!({"_id": "b1", "title": "Dune"})))
            .await
            .unwrap();
        store.close().await.unwrap();

        let reopened = MemoryStore::open(&path).await.unwrap();
        let books = reopened
            .find("books", &Filter::All, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(books, vec![doc(json!({"_id": "b1", "title": "Dune"}))]);

        reopened
            .insert_one("wishlist", doc(json!({"user": "a@x.com"})))
            .await
            .unwrap();
        assert!(reopened
            .insert_one("wishlist", doc(json!({"user": "a@x.com"})))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn failed_snapshot_keeps_store_open() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("sub");
        let path = blocked.join("catalog.json");

        let store = MemoryStore::open(&path).await.unwrap();
        store
            .insert_one("books", doc(json!({"_id": "b1", "title": "Dune"})))
            .await
            .unwrap();

        std::fs::write(&blocked, b"not a directory").unwrap();
        assert!(store.close().await.is_err());
        assert!(store.close().await.is_err());

        store.ping().await.unwrap();
        let books = store
            .find("books", &Filter::All, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(books.len(), 1);

        std::fs::remove_file(&blocked).unwrap();
        store.close().await.unwrap();
        assert!(store.ping().await.is_err());

        let reopened = MemoryStore::open(&path).await.unwrap();
        let books = reopened
            .find("books", &Filter::All, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(books, vec![doc(json!({"_id": "b1", "title": "Dune"}))]);
    }
}
