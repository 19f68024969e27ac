pub mod models;
pub mod query;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_db::Database;
use catalog_kernel::{InitCtx, Migration, Module, Schema};
use serde_json::json;

pub use service::{BookService, BOOKS_COLLECTION};

/// Catalog of books with search and reviews.
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(db: &Database) -> Self {
        Self {
            service: BookService::new(db),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "description": "Error",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } } }
        });
        let id_param = json!({
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });
        let book = json!({ "$ref": "#/components/schemas/Book" });
        let book_list = json!({ "type": "array", "items": book });
        let ok = |schema: &serde_json::Value| {
            json!({ "description": "OK", "content": { "application/json": { "schema": schema } } })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Search books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "search", "in": "query", "schema": { "type": "string" },
                              "description": "Substring of title, author or genre" },
                            { "name": "genre", "in": "query", "schema": { "type": "string" } },
                            { "name": "publicationYear", "in": "query", "schema": { "type": "string" } }
                        ],
                        "responses": { "200": ok(&book_list), "500": error }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": { "required": true, "content": { "application/json": {
                            "schema": { "$ref": "#/components/schemas/NewBook" } } } },
                        "responses": {
                            "201": { "description": "Created", "content": { "application/json": { "schema": book } } },
                            "500": error
                        }
                    }
                },
                "/recent": {
                    "get": {
                        "summary": "Ten most recently added books",
                        "tags": ["Books"],
                        "responses": { "200": ok(&book_list), "500": error }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": { "200": { "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } } } }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": { "200": ok(&book), "400": error, "404": error }
                    },
                    "patch": {
                        "summary": "Update book fields",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "requestBody": { "required": true, "content": { "application/json": {
                            "schema": { "$ref": "#/components/schemas/BookPatch" } } } },
                        "responses": { "200": ok(&book), "400": error, "404": error }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": ok(&json!({ "type": "object",
                                "properties": { "acknowledged": { "type": "boolean" },
                                                "deletedCount": { "type": "integer" } } })),
                            "400": error,
                            "404": error
                        }
                    }
                },
                "/{id}/reviews": {
                    "get": {
                        "summary": "List reviews",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": { "200": ok(&json!({ "$ref": "#/components/schemas/ReviewList" })),
                                       "400": error, "404": error }
                    },
                    "post": {
                        "summary": "Append a review",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "requestBody": { "required": true, "content": { "application/json": {
                            "schema": { "type": "object", "properties": { "review": { "type": "string" } },
                                        "required": ["review"] } } } },
                        "responses": { "200": ok(&json!({ "type": "object",
                                            "properties": { "message": { "type": "string" } } })),
                                       "400": error, "404": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string", "description": "Store-generated identifier" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string" },
                            "publicationDate": { "type": "string", "description": "Free-form date text" },
                            "reviews": { "type": "array", "items": { "type": "string" } }
                        },
                        "required": ["_id", "title", "author", "genre", "publicationDate", "reviews"]
                    },
                    "NewBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string" },
                            "publicationDate": { "type": "string" },
                            "reviews": { "type": "array", "items": { "type": "string" } }
                        }
                    },
                    "BookPatch": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "genre": { "type": "string" },
                            "publicationDate": { "type": "string" }
                        }
                    },
                    "ReviewList": {
                        "type": "object",
                        "properties": { "reviews": { "type": "array", "items": { "type": "string" } } },
                        "required": ["reviews"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            steps: vec![Schema::Collection(BOOKS_COLLECTION)],
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

pub fn create_module(db: &Database) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(db))
}
