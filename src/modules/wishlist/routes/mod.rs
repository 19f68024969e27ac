use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use catalog_db::UpdateOutcome;
use catalog_http::error::AppError;

use super::models::{UpsertEntry, WishlistEntry, WishlistView};
use super::service::WishlistService;
use crate::utils::{parse_book_id, parse_user_email};

/// `/health` shares its shape with `/{email}`; it stays unambiguous because
/// every `{email}` segment must contain an `@`.
pub fn router(service: WishlistService) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/{email}", get(list_wishlist).post(upsert_entry))
        .route("/{email}/status/{book_id}", get(entry_status))
        .route("/{email}/{book_id}", delete(remove_entry))
        .with_state(service)
}

async fn health_check() -> &'static str {
    "wishlist module is healthy"
}

async fn upsert_entry(
    State(service): State<WishlistService>,
    Path(email): Path<String>,
    Json(body): Json<UpsertEntry>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let email = parse_user_email(&email)?;
    let entry = WishlistEntry {
        book: parse_book_id(&body.book)?,
        status: body.status,
    };
    Ok(Json(service.upsert_entry(&email, &entry).await?))
}

async fn entry_status(
    State(service): State<WishlistService>,
    Path((email, book_id)): Path<(String, String)>,
) -> Result<Json<String>, AppError> {
    let email = parse_user_email(&email)?;
    let book_id = parse_book_id(&book_id)?;
    service
        .status(&email, &book_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Book status not found"))
}

async fn list_wishlist(
    State(service): State<WishlistService>,
    Path(email): Path<String>,
) -> Result<Json<WishlistView>, AppError> {
    let email = parse_user_email(&email)?;
    Ok(Json(service.list(&email).await?))
}

async fn remove_entry(
    State(service): State<WishlistService>,
    Path((email, book_id)): Path<(String, String)>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let email = parse_user_email(&email)?;
    let book_id = parse_book_id(&book_id)?;
    service
        .remove_entry(&email, &book_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Wishlist not found"))
}
