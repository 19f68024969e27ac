//! Process wiring: store, module registry, lifecycle and HTTP server.

use std::future::Future;

use anyhow::Context;
use axum::Router;
use catalog_db::Database;
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// A fully wired application, ready to be prepared and served.
pub struct App {
    settings: Settings,
    db: Database,
    registry: ModuleRegistry,
}

impl App {
    /// Open the configured store and register every module.
    ///
    /// Fails when the store cannot be opened or does not answer a ping.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let db = Database::connect(&settings.database.endpoint, &settings.database.name)
            .await
            .with_context(|| {
                format!(
                    "failed to open document store at {}",
                    settings.database.endpoint
                )
            })?;
        db.ping().await.context("document store did not answer ping")?;

        Ok(Self::with_database(settings, db))
    }

    pub fn with_database(settings: Settings, db: Database) -> Self {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db);
        tracing::info!(
            core = registry.core_module_count(),
            custom = registry.custom_module_count(),
            "modules registered"
        );

        Self {
            settings,
            db,
            registry,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn router(&self) -> Router {
        catalog_http::build_router(&self.registry, &self.settings)
    }

    fn ctx(&self) -> InitCtx<'_> {
        InitCtx {
            settings: &self.settings,
            db: &self.db,
        }
    }

    /// Initialize modules and apply pending migrations. Returns how many ran.
    pub async fn migrate(&self) -> anyhow::Result<usize> {
        self.registry.init_all(&self.ctx()).await?;
        let applied = self.registry.migrate(&self.db).await?;
        tracing::info!(applied, "migrations complete");
        Ok(applied)
    }

    /// Migrate, start every module and serve until `shutdown` resolves.
    ///
    /// Modules are stopped on the way out even when startup or serving fails.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let served: anyhow::Result<()> = async {
            self.migrate().await?;
            self.registry.start_all(&self.ctx()).await?;
            catalog_http::start_server(&self.registry, &self.settings, shutdown).await
        }
        .await;

        let stopped = self.registry.stop_all().await;
        served.and(stopped)
    }

    /// Stop every module, closing the store.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.registry.stop_all().await
    }
}

/// Build the app from `settings` and serve until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    App::build(settings).await?.serve(shutdown_signal()).await
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(error = %err, "failed to listen for shutdown signal"),
    }
}
