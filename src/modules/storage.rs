//! Core module owning the document store lifecycle.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::{extract::State, routing::get, Router};
use catalog_db::Database;
use catalog_http::error::AppError;
use catalog_kernel::{InitCtx, Module};

pub struct StorageModule {
    db: Database,
}

#[async_trait]
impl Module for StorageModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.db
            .ping()
            .await
            .with_context(|| format!("document store at {} is unreachable", ctx.settings.database.endpoint))?;
        tracing::info!(module = self.name(), database = self.db.name(), "document store reachable");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .with_state(self.db.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Document store health check",
                        "tags": ["Storage"],
                        "responses": {
                            "200": { "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } } },
                            "500": { "description": "Store unavailable",
                                "content": { "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ErrorResponse" } } } }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.db
            .close()
            .await
            .context("failed to close document store")
    }
}

async fn health_check(State(db): State<Database>) -> Result<&'static str, AppError> {
    db.ping().await?;
    Ok("ok")
}

pub fn create_module(db: Database) -> Arc<dyn Module> {
    Arc::new(StorageModule { db })
}
