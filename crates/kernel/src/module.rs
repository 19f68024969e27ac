use async_trait::async_trait;
use axum::Router;
use catalog_db::{Database, Migration};

/// Everything a module may need while it is brought up.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
    /// Shared store handle, opened once at process start.
    pub db: &'a Database,
}

/// A unit of functionality plugged into the service.
///
/// Lifecycle: `init` → migrations → `start` → serving → `stop`.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name; also the mount point `/api/{name}`.
    fn name(&self) -> &'static str;

    /// Called before migrations run.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// HTTP routes, nested under `/api/{name}`. State must already be applied.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` and `components.schemas`) merged into the
    /// service document. Paths are relative to the module mount point.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Schema migrations, applied in the order returned.
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called after migrations are applied.
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during shutdown, in reverse registration order.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
