//! Book persistence on top of the `books` collection.

use catalog_db::{
    from_document, to_document, Collection, Database, DeleteOutcome, Filter, FindOptions,
    Projection, StoreError, Update, UpdateOptions, UpdateOutcome, ID_FIELD,
};

use super::models::{Book, BookPatch, NewBook, ReviewList};
use super::query::{self, BookQuery};

pub const BOOKS_COLLECTION: &str = "books";

/// Catalog operations. Ids passed in are expected to be normalized already.
#[derive(Clone)]
pub struct BookService {
    books: Collection,
}

impl BookService {
    pub fn new(db: &Database) -> Self {
        Self {
            books: db.collection(BOOKS_COLLECTION),
        }
    }

    fn by_id(id: &str) -> Filter {
        Filter::eq(ID_FIELD, id)
    }

    pub async fn create(&self, new_book: NewBook) -> Result<Book, StoreError> {
        let mut document = to_document(&new_book)?;
        let outcome = self.books.insert_one(document.clone()).await?;
        document.insert(ID_FIELD.to_string(), outcome.inserted_id);

        tracing::info!(book_id = ?document.get(ID_FIELD), "book created");
        from_document(document)
    }

    /// Books matching `query`, in insertion order.
    pub async fn search(&self, query: &BookQuery) -> Result<Vec<Book>, StoreError> {
        let documents = self
            .books
            .find(&query.filter(), &FindOptions::default())
            .await?;
        documents.into_iter().map(from_document).collect()
    }

    /// The most recently inserted books, newest first.
    pub async fn recently_added(&self) -> Result<Vec<Book>, StoreError> {
        let documents = self
            .books
            .find(&Filter::All, &query::recently_added())
            .await?;
        documents.into_iter().map(from_document).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Book>, StoreError> {
        self.books
            .find_by_id(id)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Apply `patch` and return the stored result, or `None` when no book has `id`.
    pub async fn update(&self, id: &str, patch: &BookPatch) -> Result<Option<Book>, StoreError> {
        let outcome = self
            .books
            .update_one(
                &Self::by_id(id),
                &Update::set(to_document(patch)?),
                UpdateOptions::default(),
            )
            .await?;
        if outcome.matched_count == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        let outcome = self.books.delete_one(&Self::by_id(id)).await?;
        if outcome.deleted_count > 0 {
            tracing::info!(book_id = id, "book deleted");
        }
        Ok(outcome)
    }

    /// Append a review. `modified_count` is zero when no book has `id`.
    pub async fn add_review(&self, id: &str, review: String) -> Result<UpdateOutcome, StoreError> {
        self.books
            .update_one(
                &Self::by_id(id),
                &Update::push("reviews", review),
                UpdateOptions::default(),
            )
            .await
    }

    /// Reviews of the book, oldest first.
    pub async fn reviews(&self, id: &str) -> Result<Option<Vec<String>>, StoreError> {
        let projection = Projection::include(["reviews"]).without_id();
        let Some(document) = self.books.find_one_with(&Self::by_id(id), Some(projection)).await?
        else {
            return Ok(None);
        };
        let list: ReviewList = from_document(document)?;
        Ok(Some(list.reviews))
    }
}
