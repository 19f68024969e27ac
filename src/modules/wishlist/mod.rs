pub mod models;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_db::Database;
use catalog_kernel::{InitCtx, Migration, Module, Schema};
use serde_json::json;

pub use service::{WishlistService, WISHLIST_COLLECTION};

/// Per-user reading lists keyed by email.
pub struct WishlistModule {
    service: WishlistService,
}

impl WishlistModule {
    pub fn new(db: &Database) -> Self {
        Self {
            service: WishlistService::new(db),
        }
    }
}

#[async_trait]
impl Module for WishlistModule {
    fn name(&self) -> &'static str {
        "wishlist"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            database = ctx.db.name(),
            "wishlist module initialized"
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
        let email = json!({
            "name": "email", "in": "path", "required": true,
            "schema": { "type": "string", "format": "email" }
        });
        let book_id = json!({
            "name": "book_id", "in": "path", "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });
        let outcome = json!({
            "description": "Store acknowledgement",
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/UpdateOutcome" } } }
        });

        Some(json!({
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Wishlist health check",
                        "tags": ["Wishlist"],
                        "responses": { "200": { "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } } } }
                    }
                },
                "/{email}": {
                    "get": {
                        "summary": "Wishlist joined with books",
                        "tags": ["Wishlist"],
                        "parameters": [email],
                        "responses": {
                            "200": { "description": "OK", "content": { "application/json": {
                                "schema": { "$ref": "#/components/schemas/WishlistView" } } } },
                            "400": error,
                            "500": error
                        }
                    },
                    "post": {
                        "summary": "Add a book or change its status",
                        "tags": ["Wishlist"],
                        "parameters": [email],
                        "requestBody": { "required": true, "content": { "application/json": {
                            "schema": { "$ref": "#/components/schemas/WishlistEntry" } } } },
                        "responses": { "200": outcome, "400": error }
                    }
                },
                "/{email}/status/{book_id}": {
                    "get": {
                        "summary": "Reading status of one book",
                        "tags": ["Wishlist"],
                        "parameters": [email, book_id],
                        "responses": {
                            "200": { "description": "Status", "content": { "application/json": {
                                "schema": { "type": "string" } } } },
                            "400": error,
                            "404": error
                        }
                    }
                },
                "/{email}/{book_id}": {
                    "delete": {
                        "summary": "Remove a book from the wishlist",
                        "tags": ["Wishlist"],
                        "parameters": [email, book_id],
                        "responses": { "200": outcome, "400": error, "404": error }
                    }
                }
            },
            "components": {
                "schemas": {
                    "WishlistEntry": {
                        "type": "object",
                        "properties": {
                            "book": { "type": "string", "description": "Book id" },
                            "status": { "type": "string", "description": "Reading status, e.g. want or read" }
                        },
                        "required": ["book", "status"]
                    },
                    "WishlistView": {
                        "type": "object",
                        "properties": {
                            "wishlist": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "book": { "$ref": "#/components/schemas/Book" },
                                        "status": { "type": "string" }
                                    },
                                    "required": ["book", "status"]
                                }
                            }
                        },
                        "required": ["wishlist"]
                    },
                    "UpdateOutcome": {
                        "type": "object",
                        "properties": {
                            "acknowledged": { "type": "boolean" },
                            "matchedCount": { "type": "integer" },
                            "modifiedCount": { "type": "integer" },
                            "upsertedId": { "type": ["string", "null"] }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            steps: vec![
                Schema::Collection(WISHLIST_COLLECTION),
                Schema::UniqueIndex {
                    collection: WISHLIST_COLLECTION,
                    field: "user",
                },
            ],
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "wishlist module stopped");
        Ok(())
    }
}

pub fn create_module(db: &Database) -> Arc<dyn Module> {
    Arc::new(WishlistModule::new(db))
}
