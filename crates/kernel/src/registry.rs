use anyhow::Context;
use std::sync::Arc;

use catalog_db::{migrate, Database, Migration};

use crate::module::{InitCtx, Module};

/// Core modules are brought up in this order and torn down in reverse.
/// Modules not listed here are skipped even if registered as core.
const CORE_MODULE_ORDER: &[&str] = &[
    "db", // Store lifecycle; must outlive every custom module
];

/// Module registry for managing module lifecycle with core/custom separation
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// Core modules in lifecycle order.
    fn ordered_core(&self) -> impl Iterator<Item = &Arc<dyn Module>> + '_ {
        CORE_MODULE_ORDER.iter().filter_map(move |&name| {
            self.core_modules
                .iter()
                .find(|module| module.name() == name)
        })
    }

    /// Get all registered modules (core in lifecycle order, then custom)
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        self.ordered_core()
            .chain(self.custom_modules.iter())
            .collect()
    }

    /// Get a module by name (searches both core and custom modules)
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .chain(self.custom_modules.iter())
            .find(|module| module.name() == name)
    }

    pub fn core_module_count(&self) -> usize {
        self.core_modules.len()
    }

    pub fn custom_module_count(&self) -> usize {
        self.custom_modules.len()
    }

    /// Initialize core modules in order, then custom modules
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            "initializing core modules in order: {:?}",
            CORE_MODULE_ORDER
        );
        for module in self.ordered_core() {
            tracing::info!(module = module.name(), "initializing core module");
            module.init(ctx).await.with_context(|| {
                format!("failed to initialize core module '{}'", module.name())
            })?;
        }

        tracing::info!("initializing {} custom modules", self.custom_modules.len());
        for module in &self.custom_modules {
            tracing::info!(module = module.name(), "initializing custom module");
            module.init(ctx).await.with_context(|| {
                format!("failed to initialize custom module '{}'", module.name())
            })?;
        }

        Ok(())
    }

    /// Start core modules in order, then custom modules
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.modules() {
            tracing::info!(module = module.name(), "starting module");
            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop custom modules in reverse, then core modules in reverse.
    ///
    /// Every module is asked to stop even if an earlier one fails; the first
    /// failure is returned.
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules().len());

        let mut first_error = None;
        for module in self.modules().into_iter().rev() {
            tracing::info!(module = module.name(), "stopping module");
            if let Err(err) = module.stop().await {
                tracing::error!(module = module.name(), error = %err, "module failed to stop");
                first_error.get_or_insert(
                    err.context(format!("failed to stop module '{}'", module.name())),
                );
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Collect all migrations from all modules (core + custom)
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations: Vec<(String, Migration)> = self
            .core_modules
            .iter()
            .chain(self.custom_modules.iter())
            .flat_map(|module| {
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (module.name().to_string(), migration))
            })
            .collect();

        // Sort by module name and migration ID for deterministic ordering
        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));

        migrations
    }

    /// Apply pending migrations of every module. Returns how many ran.
    pub async fn migrate(&self, db: &Database) -> anyhow::Result<usize> {
        let migrations = self.collect_migrations();
        tracing::info!(count = migrations.len(), "applying module migrations");

        migrate::apply_all(db, &migrations)
            .await
            .context("failed to apply migrations")
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use catalog_db::Schema;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
        fail_stop: bool,
    }

    impl TestModule {
        fn new(name: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal: journal.clone(),
                fail_stop: false,
            })
        }

        fn record(&self, event: &str) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{event}", self.name));
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("init");
            Ok(())
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![Migration {
                id: "001_init",
                steps: vec![Schema::Collection(self.name)],
            }]
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("start");
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.record("stop");
            if self.fail_stop {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collect_migrations().is_empty());
    }

    #[test]
    fn unknown_core_modules_are_skipped() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_core(TestModule::new("mystery", &journal));
        assert_eq!(registry.core_module_count(), 1);
        assert!(registry.modules().is_empty());
        assert!(registry.get_module("mystery").is_some());
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_custom(TestModule::new("books", &journal));
        registry.register_core(TestModule::new("db", &journal));
        registry.register_custom(TestModule::new("wishlist", &journal));

        let settings = Settings::default();
        let db = Database::in_memory("test");
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        registry.init_all(&ctx).await.unwrap();
        assert_eq!(registry.migrate(&db).await.unwrap(), 3);
        assert_eq!(registry.migrate(&db).await.unwrap(), 0);
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();

        let events = journal.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "db:init",
                "books:init",
                "wishlist:init",
                "db:start",
                "books:start",
                "wishlist:start",
                "wishlist:stop",
                "books:stop",
                "db:stop",
            ]
        );
    }

    #[tokio::test]
    async fn stop_continues_after_failure() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_core(TestModule::new("db", &journal));
        registry.register_custom(Arc::new(TestModule {
            name: "books",
            journal: journal.clone(),
            fail_stop: true,
        }));

        let err = registry.stop_all().await.unwrap_err();
        assert!(err.to_string().contains("books"));
        assert_eq!(
            journal.lock().unwrap().clone(),
            vec!["books:stop", "db:stop"]
        );
    }

    #[test]
    fn migrations_sorted_by_module_then_id() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_custom(TestModule::new("wishlist", &journal));
        registry.register_custom(TestModule::new("books", &journal));

        let modules: Vec<String> = registry
            .collect_migrations()
            .into_iter()
            .map(|(module, _)| module)
            .collect();
        assert_eq!(modules, vec!["books", "wishlist"]);
    }
}
