//! Per-user reading wishlists stored in the `wishlist` collection.

use catalog_db::{
    from_document, to_document, Collection, Database, Document, Filter, Projection, Stage,
    StoreError, Update, UpdateOptions, UpdateOutcome, ID_FIELD,
};

use super::models::{UserWishlist, WishlistEntry, WishlistView};
use crate::modules::books::BOOKS_COLLECTION;

pub const WISHLIST_COLLECTION: &str = "wishlist";

#[derive(Clone)]
pub struct WishlistService {
    wishlists: Collection,
}

impl WishlistService {
    pub fn new(db: &Database) -> Self {
        Self {
            wishlists: db.collection(WISHLIST_COLLECTION),
        }
    }

    fn owned_by(user: &str) -> Filter {
        Filter::eq("user", user)
    }

    async fn load(&self, user: &str) -> Result<Option<UserWishlist>, StoreError> {
        self.wishlists
            .find_one(&Self::owned_by(user))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Add `entry` to the user's wishlist, or replace the status of the
    /// existing entry for the same book. Creates the wishlist on first use.
    pub async fn upsert_entry(
        &self,
        user: &str,
        entry: &WishlistEntry,
    ) -> Result<UpdateOutcome, StoreError> {
        let outcome = self
            .wishlists
            .update_one(
                &Self::owned_by(user),
                &Update::upsert_element("wishlist", "book", to_document(entry)?),
                UpdateOptions::upsert(),
            )
            .await?;

        tracing::info!(
            user,
            book = %entry.book,
            status = %entry.status,
            created = outcome.upserted(),
            "wishlist entry saved"
        );
        Ok(outcome)
    }

    /// Status of `book` in the user's wishlist, if listed.
    pub async fn status(&self, user: &str, book: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load(user).await?.and_then(|wishlist| {
            wishlist
                .wishlist
                .into_iter()
                .find(|entry| entry.book == book)
                .map(|entry| entry.status)
        }))
    }

    /// The wishlist with each entry joined to its book.
    ///
    /// Entries whose book no longer exists are left out.
    pub async fn list(&self, user: &str) -> Result<WishlistView, StoreError> {
        let pipeline = [
            Stage::Match(Self::owned_by(user)),
            Stage::Project(Projection::include(["wishlist"]).without_id()),
            Stage::unwind("wishlist"),
            Stage::lookup(BOOKS_COLLECTION, "wishlist.book", ID_FIELD, "wishlist.book"),
            Stage::unwind("wishlist.book"),
            Stage::collect_all("wishlist", "wishlist"),
            Stage::Project(Projection::include(["wishlist"]).without_id()),
        ];

        match self.wishlists.aggregate(&pipeline).await?.into_iter().next() {
            Some(document) => from_document(document),
            None => Ok(WishlistView::default()),
        }
    }

    /// Drop `book` from the user's wishlist.
    ///
    /// `None` when the user has no wishlist. Removing a book that is not
    /// listed succeeds with nothing modified.
    pub async fn remove_entry(
        &self,
        user: &str,
        book: &str,
    ) -> Result<Option<UpdateOutcome>, StoreError> {
        let Some(mut wishlist) = self.load(user).await? else {
            return Ok(None);
        };
        wishlist.wishlist.retain(|entry| entry.book != book);

        let mut fields = Document::new();
        fields.insert(
            "wishlist".to_string(),
            serde_json::to_value(&wishlist.wishlist)?,
        );
        let outcome = self
            .wishlists
            .update_one(
                &Self::owned_by(user),
                &Update::set(fields),
                UpdateOptions::default(),
            )
            .await?;
        Ok(Some(outcome))
    }
}
