//! Schema migrations contributed by modules.

use serde_json::json;

use crate::document::{Document, ID_FIELD};
use crate::error::StoreError;
use crate::filter::Filter;
use crate::Database;

/// Collection recording applied migrations.
pub const MIGRATIONS_COLLECTION: &str = "_migrations";

/// A single schema step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    Collection(&'static str),
    UniqueIndex {
        collection: &'static str,
        field: &'static str,
    },
}

/// Migration definition for modules
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub steps: Vec<Schema>,
}

fn record_id(module: &str, migration: &Migration) -> String {
    format!("{module}:{}", migration.id)
}

/// Apply migrations not yet recorded, in the given order.
///
/// Returns the number of migrations that ran.
pub async fn apply_all(
    db: &Database,
    migrations: &[(String, Migration)],
) -> Result<usize, StoreError> {
    let ledger = db.collection(MIGRATIONS_COLLECTION);
    let mut applied = 0;

    for (module, migration) in migrations {
        let id = record_id(module, migration);
        if ledger.find_one(&Filter::eq(ID_FIELD, id.as_str())).await?.is_some() {
            tracing::debug!(target: "catalog-db", migration = %id, "migration already applied");
            continue;
        }

        for step in &migration.steps {
            match step {
                Schema::Collection(name) => db.store().create_collection(name).await?,
                Schema::UniqueIndex { collection, field } => {
                    db.store().create_unique_index(collection, field).await?
                }
            }
        }

        let mut record = Document::new();
        record.insert(ID_FIELD.to_string(), json!(&id));
        record.insert("module".to_string(), json!(module));
        record.insert("migration".to_string(), json!(migration.id));
        ledger.insert_one(record).await?;

        tracing::info!(target: "catalog-db", migration = %id, "applied migration");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FindOptions;

    fn wishlist_migration() -> Vec<(String, Migration)> {
        vec![(
            "wishlist".to_string(),
            Migration {
                id: "001_init",
                steps: vec![
                    Schema::Collection("wishlist"),
                    Schema::UniqueIndex {
                        collection: "wishlist",
                        field: "user",
                    },
                ],
            },
        )]
    }

    #[tokio::test]
    async fn migrations_run_once() {
        let db = Database::in_memory("test");
        assert_eq!(apply_all(&db, &wishlist_migration()).await.unwrap(), 1);
        assert_eq!(apply_all(&db, &wishlist_migration()).await.unwrap(), 0);

        let ledger = db
            .collection(MIGRATIONS_COLLECTION)
            .find(&Filter::All, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0]["_id"], "wishlist:001_init");
    }

    #[tokio::test]
    async fn unique_index_step_is_enforced() {
        let db = Database::in_memory("test");
        apply_all(&db, &wishlist_migration()).await.unwrap();

        let wishlist = db.collection("wishlist");
        let entry = json!({"user": "a@x.com"}).as_object().cloned().unwrap();
        wishlist.insert_one(entry.clone()).await.unwrap();
        assert!(matches!(
            wishlist.insert_one(entry).await,
            Err(StoreError::DuplicateKey { .. })
        ));
    }
}
