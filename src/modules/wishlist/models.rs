use serde::{Deserialize, Serialize};

use crate::modules::books::models::Book;

/// One stored wishlist entry: a book id and its reading status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub book: String,
    pub status: String,
}

/// Request body for adding or re-statusing a book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpsertEntry {
    pub book: String,
    pub status: String,
}

/// The per-user document in the `wishlist` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWishlist {
    pub user: String,
    #[serde(default)]
    pub wishlist: Vec<WishlistEntry>,
}

/// Entry joined with its book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub book: Book,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistView {
    #[serde(default)]
    pub wishlist: Vec<WishlistItem>,
}
