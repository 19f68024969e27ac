use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalog_db::DeleteOutcome;
use catalog_http::error::AppError;

use super::models::{Book, BookPatch, Message, NewBook, NewReview, ReviewList};
use super::query::BookQuery;
use super::service::BookService;
use crate::utils::parse_book_id;

pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/recent", get(recently_added))
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .route("/{id}/reviews", get(list_reviews).post(add_review))
        .with_state(service)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

/// `GET /` with optional `search`, `genre`, `publicationYear`
async fn list_books(
    State(service): State<BookService>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let query = BookQuery::from_pairs(params);
    tracing::debug!(?query, "searching books");
    Ok(Json(service.search(&query).await?))
}

async fn create_book(
    State(service): State<BookService>,
    Json(new_book): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = service.create(new_book).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn recently_added(State(service): State<BookService>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.recently_added().await?))
}

async fn get_book(
    State(service): State<BookService>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = parse_book_id(&id)?;
    service
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Book not found"))
}

async fn update_book(
    State(service): State<BookService>,
    Path(id): Path<String>,
    Json(patch): Json<BookPatch>,
) -> Result<Json<Book>, AppError> {
    let id = parse_book_id(&id)?;
    service
        .update(&id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Book not found or not updated"))
}

async fn delete_book(
    State(service): State<BookService>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let id = parse_book_id(&id)?;
    let outcome = service.delete(&id).await?;
    if outcome.deleted_count == 0 {
        return Err(AppError::not_found("Book not found"));
    }
    Ok(Json(outcome))
}

async fn add_review(
    State(service): State<BookService>,
    Path(id): Path<String>,
    Json(body): Json<NewReview>,
) -> Result<Json<Message>, AppError> {
    let id = parse_book_id(&id)?;
    let outcome = service.add_review(&id, body.review).await?;
    if outcome.modified_count != 1 {
        return Err(AppError::not_found("Book not found or review not added"));
    }
    Ok(Json(Message {
        message: "Review added successfully",
    }))
}

async fn list_reviews(
    State(service): State<BookService>,
    Path(id): Path<String>,
) -> Result<Json<ReviewList>, AppError> {
    let id = parse_book_id(&id)?;
    service
        .reviews(&id)
        .await?
        .map(|reviews| Json(ReviewList { reviews }))
        .ok_or_else(|| AppError::not_found("Book not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::send;
    use axum::http::Method;
    use catalog_db::Database;
    use serde_json::json;

    fn app() -> Router {
        router(BookService::new(&Database::in_memory("catalog")))
    }

    async fn create(app: &Router, body: serde_json::Value) -> String {
        let (status, book) = send(app, Method::POST, "/", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        book["_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let app = app();
        let id = create(
            &app,
            json!({"title": "Dune", "author": "Frank Herbert", "genre": "SciFi", "publicationDate": "1965"}),
        )
        .await;

        let (status, book) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(book["title"], "Dune");
        assert_eq!(book["publicationDate"], "1965");
        assert_eq!(book["reviews"], json!([]));
    }

    #[tokio::test]
    async fn listing_applies_query_parameters() {
        let app = app();
        create(&app, json!({"title": "Dune", "author": "Frank Herbert", "genre": "SciFi", "publicationDate": "1965"})).await;
        create(&app, json!({"title": "Solaris", "author": "Stanislaw Lem", "genre": "SciFi", "publicationDate": "1961"})).await;
        create(&app, json!({"title": "Emma", "author": "Jane Austen", "genre": "Romance", "publicationDate": "1815"})).await;

        let (_, all) = send(&app, Method::GET, "/", None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);

        let (_, found) = send(&app, Method::GET, "/?search=herbert", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["title"], "Dune");

        let (_, found) = send(&app, Method::GET, "/?genre=scifi&publicationYear=1961", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["title"], "Solaris");

        let (status, found) = send(&app, Method::GET, "/?search=&unknown=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn recent_is_capped_at_ten() {
        let app = app();
        for n in 0..11 {
            create(&app, json!({"title": format!("Book {n}")})).await;
        }

        let (status, recent) = send(&app, Method::GET, "/recent", None).await;
        assert_eq!(status, StatusCode::OK);
        let recent = recent.as_array().unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0]["title"], "Book 10");
    }

    #[tokio::test]
    async fn patch_and_delete() {
        let app = app();
        let id = create(&app, json!({"title": "Dune", "genre": "SciFi"})).await;

        let (status, book) = send(
            &app,
            Method::PATCH,
            &format!("/{id}"),
            Some(json!({"genre": "Science Fiction"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(book["genre"], "Science Fiction");
        assert_eq!(book["title"], "Dune");

        let (status, outcome) = send(&app, Method::DELETE, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["deletedCount"], 1);

        let (status, body) = send(&app, Method::DELETE, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Book not found");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/{id}"),
            Some(json!({"title": "Gone"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Book not found or not updated");
    }

    #[tokio::test]
    async fn reviews_round_trip() {
        let app = app();
        let id = create(&app, json!({"title": "Dune"})).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/{id}/reviews"),
            Some(json!({"review": "Great"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Review added successfully");

        let (status, body) = send(&app, Method::GET, &format!("/{id}/reviews"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"reviews": ["Great"]}));
    }

    #[tokio::test]
    async fn missing_and_malformed_ids() {
        let app = app();
        let missing = "00000000-0000-7000-8000-000000000000";

        let (status, _) = send(&app, Method::GET, &format!("/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/{missing}/reviews"),
            Some(json!({"review": "?"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Book not found or review not added");

        let (status, body) = send(&app, Method::GET, &format!("/{missing}/reviews"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Book not found");

        let (status, body) = send(&app, Method::GET, "/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }
}
